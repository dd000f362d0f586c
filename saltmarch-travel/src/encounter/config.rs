use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Difficulty;
use crate::constants::{
    DEFAULT_CR_OFFSET_MAX, DEFAULT_CR_OFFSET_MIN, DEFAULT_ENCOUNTER_CHECK_PROBABILITY,
    DEFAULT_FALLBACK_TERRAIN, DEFAULT_MAX_CREATURE_COUNT,
};

/// Tuning for hourly encounter checks and the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    #[serde(default = "EncounterConfig::default_enabled")]
    pub enabled: bool,
    /// Chance of an encounter per travelled hour.
    #[serde(default = "EncounterConfig::default_check_probability")]
    pub check_probability: f64,
    #[serde(default)]
    pub target_difficulty: Difficulty,
    /// CR window relative to the rounded mean party level.
    #[serde(default = "EncounterConfig::default_cr_offset_min")]
    pub cr_offset_min: i32,
    #[serde(default = "EncounterConfig::default_cr_offset_max")]
    pub cr_offset_max: i32,
    #[serde(default = "EncounterConfig::default_max_creature_count")]
    pub max_creature_count: u32,
    /// Terrain id used when the map has no data for the party's cell.
    #[serde(default = "EncounterConfig::default_fallback_terrain")]
    pub fallback_terrain: String,
}

impl EncounterConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_check_probability() -> f64 {
        DEFAULT_ENCOUNTER_CHECK_PROBABILITY
    }

    const fn default_cr_offset_min() -> i32 {
        DEFAULT_CR_OFFSET_MIN
    }

    const fn default_cr_offset_max() -> i32 {
        DEFAULT_CR_OFFSET_MAX
    }

    const fn default_max_creature_count() -> u32 {
        DEFAULT_MAX_CREATURE_COUNT
    }

    fn default_fallback_terrain() -> String {
        DEFAULT_FALLBACK_TERRAIN.to_string()
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
    /// Returns `EncounterConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), EncounterConfigError> {
        if !(0.0..=1.0).contains(&self.check_probability) {
            return Err(EncounterConfigError::RangeViolation {
                field: "check_probability",
                min: 0.0,
                max: 1.0,
                value: self.check_probability,
            });
        }
        if self.cr_offset_min > self.cr_offset_max {
            return Err(EncounterConfigError::InvertedCrWindow {
                min: self.cr_offset_min,
                max: self.cr_offset_max,
            });
        }
        if self.max_creature_count == 0 {
            return Err(EncounterConfigError::MinViolation {
                field: "max_creature_count",
                min: 1,
                value: self.max_creature_count,
            });
        }
        if self.fallback_terrain.trim().is_empty() {
            return Err(EncounterConfigError::EmptyField {
                field: "fallback_terrain",
            });
        }
        Ok(())
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            check_probability: Self::default_check_probability(),
            target_difficulty: Difficulty::default(),
            cr_offset_min: Self::default_cr_offset_min(),
            cr_offset_max: Self::default_cr_offset_max(),
            max_creature_count: Self::default_max_creature_count(),
            fallback_terrain: Self::default_fallback_terrain(),
        }
    }
}

/// Errors raised when encounter configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum EncounterConfigError {
    #[error("{field} must be within [{min:.2}, {max:.2}] (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("cr_offset_min ({min}) must not exceed cr_offset_max ({max})")]
    InvertedCrWindow { min: i32, max: i32 },
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_from_partial_json() {
        let cfg = EncounterConfig::from_json(r#"{"check_probability":1.0,"target_difficulty":"hard"}"#)
            .expect("deserialize");
        assert!((cfg.check_probability - 1.0).abs() < f64::EPSILON);
        assert_eq!(cfg.target_difficulty, Difficulty::Hard);
        assert_eq!(cfg.max_creature_count, DEFAULT_MAX_CREATURE_COUNT);
        assert_eq!(cfg.fallback_terrain, "plains");
        cfg.validate().expect("valid");
    }

    #[test]
    fn invalid_values_are_reported() {
        let cfg = EncounterConfig {
            check_probability: 1.5,
            ..EncounterConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(EncounterConfigError::RangeViolation { .. })));

        let cfg = EncounterConfig {
            cr_offset_min: 2,
            cr_offset_max: 0,
            ..EncounterConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(EncounterConfigError::InvertedCrWindow { min: 2, max: 0 })
        );

        let cfg = EncounterConfig {
            max_creature_count: 0,
            ..EncounterConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
