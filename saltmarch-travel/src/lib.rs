//! Saltmarch Travel Engine
//!
//! Platform-agnostic core for overland hex travel and random encounters.
//! This crate plans routes across a hex map, animates a party along them,
//! advances game time in whole travel hours and rolls hourly encounter checks
//! sized against the party's XP thresholds. Maps, calendars, bestiaries and
//! persistence are supplied by the host through the traits in [`ports`].

pub mod constants;
pub mod duration;
pub mod encounter;
pub mod error;
pub mod events;
pub mod hex;
pub mod ids;
pub mod numbers;
pub mod ports;
pub mod progress;
pub mod rng;
pub mod route;
pub mod session;
pub mod time;
pub mod travel;

// Re-export commonly used types
pub use duration::Duration;
pub use encounter::{
    Creature, Difficulty, EncounterConfig, EncounterConfigError, EncounterCoordinator,
    EncounterCreatureGroup, EncounterOutcome, EncounterRequest, EncounterState, EncounterStatus,
    GeneratedEncounter, PartyMember, SkipReason, generate_encounter, roll_encounter_check,
};
pub use error::{CommandError, CommandResult, ErrorCode};
pub use events::{
    Command, EncounterEvent, Envelope, Event, EventBus, EventId, EventSink, SubscriptionId,
    TimeEvent, TravelEvent,
};
pub use hex::{
    CubeCoordinate, HexCoordinate, PixelPoint, cube_round, distance, hex_line, hex_to_pixel,
    hexes_in_radius, pixel_to_hex,
};
pub use ids::{IdGenerator, IdKind, SequentialIds};
pub use ports::{
    CreaturePool, FnTerrain, NullPositionStore, PartyRoster, PositionStore, TerrainInfo,
    TerrainLookup, TimeService, UnmappedTerrain,
};
pub use progress::{TravelProgress, interpolate};
pub use rng::{CountingRng, EncounterStream, RandomSource, RngBundle, ScriptedRolls};
pub use route::{
    Route, RouteSegment, Waypoint, calculate_duration, calculate_route, calculate_segment,
};
pub use session::{SessionPorts, TravelSession};
pub use time::{GameTime, SimpleClock, TimeAdvanceResult, TimeChangeReason};
pub use travel::{TravelConfig, TravelConfigError, TravelMachine, TravelState, TravelStatus};
