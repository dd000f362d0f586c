//! Travel lifecycle: planning, animated progress and arrival.

mod config;
mod machine;

pub use config::{TravelConfig, TravelConfigError, clamp_speed};
pub use machine::TravelMachine;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hex::HexCoordinate;
use crate::progress::TravelProgress;
use crate::route::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelStatus {
    #[default]
    Idle,
    Planning,
    Traveling,
    Paused,
    Arrived,
}

impl TravelStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::Traveling => "traveling",
            Self::Paused => "paused",
            Self::Arrived => "arrived",
        }
    }

    /// A journey is under way (possibly paused).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Traveling | Self::Paused)
    }
}

impl fmt::Display for TravelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the travel domain.
///
/// `progress` is only present while a journey is active. During a journey
/// `party_position` stays at the departure hex; the live position is
/// `progress.current_coord`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TravelState {
    pub status: TravelStatus,
    #[serde(default)]
    pub route: Option<Route>,
    pub party_position: HexCoordinate,
    #[serde(default)]
    pub progress: Option<TravelProgress>,
}

impl TravelState {
    /// Where the party is right now, mid-journey or not.
    #[must_use]
    pub fn current_position(&self) -> HexCoordinate {
        self.progress
            .as_ref()
            .map_or(self.party_position, |p| p.current_coord)
    }
}
