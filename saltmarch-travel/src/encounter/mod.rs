//! Random encounters: XP-budget generation and the hourly travel check.

mod config;
mod coordinator;
mod generator;
mod tables;

pub use config::{EncounterConfig, EncounterConfigError};
pub use coordinator::EncounterCoordinator;
pub use generator::{EncounterRequest, generate_encounter, roll_encounter_check};
pub use tables::{
    PartyThresholds, adjusted_xp, determine_difficulty, encounter_multiplier, matches_difficulty,
    parse_cr, party_thresholds, xp_for_cr,
};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::time::GameTime;

/// Encounter difficulty tiers, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Deadly,
}

impl Difficulty {
    pub const ALL: [Self; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Deadly];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
            Self::Deadly => 3,
        }
    }

    /// The next harder tier, `None` for deadly.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Easy => Some(Self::Medium),
            Self::Medium => Some(Self::Hard),
            Self::Hard => Some(Self::Deadly),
            Self::Deadly => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Deadly => "deadly",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creature available to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub id: String,
    pub name: String,
    /// Challenge rating; JSON may give it as a number or a fraction string.
    #[serde(deserialize_with = "tables::deserialize_cr")]
    pub cr: f64,
    /// Terrain ids this creature is found in; empty means anywhere.
    #[serde(default)]
    pub terrain_preference: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyMember {
    pub level: u32,
}

impl PartyMember {
    #[must_use]
    pub const fn new(level: u32) -> Self {
        Self { level }
    }
}

/// Creatures of one kind within an encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterCreatureGroup {
    pub creature_id: String,
    pub name: String,
    pub cr: f64,
    pub count: u32,
    pub xp_each: u32,
}

pub type CreatureGroups = SmallVec<[EncounterCreatureGroup; 4]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedEncounter {
    pub id: String,
    pub groups: CreatureGroups,
    pub total_xp: u32,
    pub adjusted_xp: u32,
    pub multiplier: f64,
    pub difficulty: Difficulty,
    pub creature_count: u32,
    pub terrain: String,
    /// Last game time seen before the check ran.
    #[serde(default)]
    pub generated_at: Option<GameTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterOutcome {
    Victory,
    Flee,
    Negotiated,
}

/// Why an hourly check did not produce an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    RollFailed,
    NoCreatures,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterStatus {
    #[default]
    Idle,
    Active,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EncounterState {
    pub status: EncounterStatus,
    #[serde(default)]
    pub active_encounter: Option<GeneratedEncounter>,
    pub travel_hours_elapsed: u32,
    pub last_check_hour: u32,
}

impl EncounterState {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, EncounterStatus::Active)
    }
}
