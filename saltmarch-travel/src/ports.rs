//! Collaborators the core consults synchronously.
//!
//! Hosts provide their map, calendar, bestiary, party roster and persistence by
//! implementing these traits; the core never reaches further than this.

use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::encounter::{Creature, PartyMember};
use crate::hex::HexCoordinate;
use crate::time::{GameTime, TimeAdvanceResult, TimeChangeReason};

/// Terrain data relevant to travel and encounter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainInfo {
    pub id: String,
    pub travel_multiplier: f64,
}

impl TerrainInfo {
    #[must_use]
    pub fn new(id: impl Into<String>, travel_multiplier: f64) -> Self {
        Self {
            id: id.into(),
            travel_multiplier,
        }
    }
}

/// Terrain at a map cell, `None` for unmapped cells.
pub trait TerrainLookup {
    fn terrain_at(&self, coord: HexCoordinate) -> Option<TerrainInfo>;
}

/// Adapter turning a closure into a [`TerrainLookup`].
pub struct FnTerrain<F>(pub F);

impl<F> TerrainLookup for FnTerrain<F>
where
    F: Fn(HexCoordinate) -> Option<TerrainInfo>,
{
    fn terrain_at(&self, coord: HexCoordinate) -> Option<TerrainInfo> {
        (self.0)(coord)
    }
}

/// Lookup that knows no terrain at all; every cell uses the configured default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmappedTerrain;

impl TerrainLookup for UnmappedTerrain {
    fn terrain_at(&self, _coord: HexCoordinate) -> Option<TerrainInfo> {
        None
    }
}

/// Calendar owner. The core only ever asks it to move forward.
pub trait TimeService {
    fn now(&self) -> GameTime;

    fn advance(&mut self, duration: Duration, reason: TimeChangeReason) -> TimeAdvanceResult;
}

/// Creatures eligible for random encounters.
pub trait CreaturePool {
    fn list(&self) -> Vec<Creature>;
}

impl CreaturePool for Vec<Creature> {
    fn list(&self) -> Vec<Creature> {
        self.clone()
    }
}

/// Current adventuring party.
pub trait PartyRoster {
    fn members(&self) -> Vec<PartyMember>;
}

impl PartyRoster for Vec<PartyMember> {
    fn members(&self) -> Vec<PartyMember> {
        self.clone()
    }
}

/// Durable storage for the party position.
///
/// Writes are fire-and-forget: callers log a failure and carry on with their
/// in-memory state.
pub trait PositionStore {
    /// Persist the party position.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the write.
    fn save_party_position(&mut self, coord: HexCoordinate) -> anyhow::Result<()>;
}

/// Store that discards every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPositionStore;

impl PositionStore for NullPositionStore {
    fn save_party_position(&mut self, _coord: HexCoordinate) -> anyhow::Result<()> {
        Ok(())
    }
}
