use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    ARRIVAL_IDLE_DELAY_MS, DEFAULT_BASE_SPEED_HEXES_PER_HOUR, DEFAULT_HEX_SIZE,
    DEFAULT_SPEED_MULTIPLIER, DEFAULT_TERRAIN_MULTIPLIER, MIN_SPEED_MULTIPLIER,
};

/// Travel pacing and presentation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelConfig {
    /// Hexes covered per game hour on terrain with multiplier 1.
    #[serde(default = "TravelConfig::default_base_speed")]
    pub base_speed_hexes_per_hour: f64,
    /// Cost used for cells the terrain lookup does not know.
    #[serde(default = "TravelConfig::default_terrain_multiplier")]
    pub default_terrain_multiplier: f64,
    /// Game minutes simulated per real second of ticks.
    #[serde(default = "TravelConfig::default_speed_multiplier")]
    pub speed_multiplier: f64,
    /// Hex radius used for pixel projection.
    #[serde(default = "TravelConfig::default_hex_size")]
    pub hex_size: f64,
    /// Whether travel pushes elapsed time into the time port.
    #[serde(default = "TravelConfig::default_advance_time")]
    pub advance_time: bool,
    /// Real-time delay before `arrived` falls back to `idle`.
    #[serde(default = "TravelConfig::default_arrival_idle_delay_ms")]
    pub arrival_idle_delay_ms: u64,
}

impl TravelConfig {
    const fn default_base_speed() -> f64 {
        DEFAULT_BASE_SPEED_HEXES_PER_HOUR
    }

    const fn default_terrain_multiplier() -> f64 {
        DEFAULT_TERRAIN_MULTIPLIER
    }

    const fn default_speed_multiplier() -> f64 {
        DEFAULT_SPEED_MULTIPLIER
    }

    const fn default_hex_size() -> f64 {
        DEFAULT_HEX_SIZE
    }

    const fn default_advance_time() -> bool {
        true
    }

    const fn default_arrival_idle_delay_ms() -> u64 {
        ARRIVAL_IDLE_DELAY_MS
    }

    /// Parse a configuration from JSON, filling absent fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `TravelConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), TravelConfigError> {
        positive("base_speed_hexes_per_hour", self.base_speed_hexes_per_hour)?;
        positive("default_terrain_multiplier", self.default_terrain_multiplier)?;
        positive("hex_size", self.hex_size)?;
        if !self.speed_multiplier.is_finite() || self.speed_multiplier < MIN_SPEED_MULTIPLIER {
            return Err(TravelConfigError::MinViolation {
                field: "speed_multiplier",
                min: MIN_SPEED_MULTIPLIER,
                value: self.speed_multiplier,
            });
        }
        Ok(())
    }

    /// Clamp out-of-range values to the nearest accepted ones.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if !is_positive(self.base_speed_hexes_per_hour) {
            self.base_speed_hexes_per_hour = defaults.base_speed_hexes_per_hour;
        }
        if !is_positive(self.default_terrain_multiplier) {
            self.default_terrain_multiplier = defaults.default_terrain_multiplier;
        }
        if !is_positive(self.hex_size) {
            self.hex_size = defaults.hex_size;
        }
        self.speed_multiplier = clamp_speed(self.speed_multiplier);
    }
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            base_speed_hexes_per_hour: Self::default_base_speed(),
            default_terrain_multiplier: Self::default_terrain_multiplier(),
            speed_multiplier: Self::default_speed_multiplier(),
            hex_size: Self::default_hex_size(),
            advance_time: Self::default_advance_time(),
            arrival_idle_delay_ms: Self::default_arrival_idle_delay_ms(),
        }
    }
}

/// Animation speeds below 1 game-minute per second are raised to 1.
#[must_use]
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.max(MIN_SPEED_MULTIPLIER)
    } else {
        MIN_SPEED_MULTIPLIER
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn positive(field: &'static str, value: f64) -> Result<(), TravelConfigError> {
    if is_positive(value) {
        Ok(())
    } else {
        Err(TravelConfigError::NotPositive { field, value })
    }
}

/// Errors raised when travel configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum TravelConfigError {
    #[error("{field} must be a positive finite number (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let cfg = TravelConfig::from_json("{}").expect("deserialize");
        assert_eq!(cfg, TravelConfig::default());
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn zero_speed_is_rejected_then_sanitized() {
        let mut cfg = TravelConfig {
            base_speed_hexes_per_hour: 0.0,
            speed_multiplier: 0.25,
            ..TravelConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(TravelConfigError::NotPositive { field, .. }) if field == "base_speed_hexes_per_hour"
        ));
        cfg.sanitize();
        assert!((cfg.base_speed_hexes_per_hour - DEFAULT_BASE_SPEED_HEXES_PER_HOUR).abs() < 1e-9);
        assert!((cfg.speed_multiplier - 1.0).abs() < 1e-9);
        cfg.validate().expect("sanitized config validates");
    }

    #[test]
    fn speed_clamp_handles_nan() {
        assert!((clamp_speed(f64::NAN) - 1.0).abs() < 1e-9);
        assert!((clamp_speed(120.0) - 120.0).abs() < 1e-9);
    }
}
