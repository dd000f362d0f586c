//! Shared tuning constants and reference tables.

/// Hexes per hour on neutral terrain.
pub const DEFAULT_BASE_SPEED_HEXES_PER_HOUR: f64 = 3.0;
/// Cost for cells with no terrain data.
pub const DEFAULT_TERRAIN_MULTIPLIER: f64 = 1.0;
/// Game minutes simulated per real second.
pub const DEFAULT_SPEED_MULTIPLIER: f64 = 60.0;
pub const MIN_SPEED_MULTIPLIER: f64 = 1.0;
pub const DEFAULT_HEX_SIZE: f64 = 42.0;
/// Real milliseconds before `arrived` reverts to `idle`.
pub const ARRIVAL_IDLE_DELAY_MS: u64 = 1_000;

pub const DEFAULT_ENCOUNTER_CHECK_PROBABILITY: f64 = 0.125;
pub const DEFAULT_CR_OFFSET_MIN: i32 = -2;
pub const DEFAULT_CR_OFFSET_MAX: i32 = 1;
pub const DEFAULT_MAX_CREATURE_COUNT: u32 = 8;
pub const DEFAULT_FALLBACK_TERRAIN: &str = "plains";

/// Deepest chain of reactions one command may cause. Events published past
/// this depth are dropped as a publish cycle.
pub const MAX_CASCADE_DEPTH: u32 = 64;

pub const MIN_PARTY_LEVEL: u32 = 1;
pub const MAX_PARTY_LEVEL: u32 = 20;

/// Per-character XP thresholds (easy, medium, hard, deadly) for levels 1-20.
pub const XP_THRESHOLDS_BY_LEVEL: [[u32; 4]; 20] = [
    [25, 50, 75, 100],
    [50, 100, 150, 200],
    [75, 150, 225, 400],
    [125, 250, 375, 500],
    [250, 500, 750, 1_100],
    [300, 600, 900, 1_400],
    [350, 750, 1_100, 1_700],
    [450, 900, 1_400, 2_100],
    [550, 1_100, 1_600, 2_400],
    [600, 1_200, 1_900, 2_800],
    [800, 1_600, 2_400, 3_600],
    [1_000, 2_000, 3_000, 4_500],
    [1_100, 2_200, 3_400, 5_100],
    [1_250, 2_500, 3_800, 5_700],
    [1_400, 2_800, 4_300, 6_400],
    [1_600, 3_200, 4_800, 7_200],
    [2_000, 3_900, 5_900, 8_800],
    [2_100, 4_200, 6_300, 9_500],
    [2_400, 4_900, 7_300, 10_900],
    [2_800, 5_700, 8_500, 12_700],
];

/// XP awarded for fractional challenge ratings.
pub const FRACTIONAL_CR_XP: [(f64, u32); 4] = [(0.0, 10), (0.125, 25), (0.25, 50), (0.5, 100)];

/// XP awarded for whole challenge ratings 1 through 30 (index = CR - 1).
pub const WHOLE_CR_XP: [u32; 30] = [
    200, 450, 700, 1_100, 1_800, 2_300, 2_900, 3_900, 5_000, 5_900, 7_200, 8_400, 10_000, 11_500,
    13_000, 15_000, 18_000, 20_000, 22_000, 25_000, 33_000, 41_000, 50_000, 62_000, 75_000,
    90_000, 105_000, 120_000, 135_000, 155_000,
];

/// Upper creature counts and the XP multiplier applied up to that count.
pub const ENCOUNTER_MULTIPLIERS: [(u32, f64); 5] =
    [(1, 1.0), (2, 1.5), (6, 2.0), (10, 2.5), (14, 3.0)];
/// Multiplier for groups larger than the last tier above.
pub const ENCOUNTER_MULTIPLIER_HORDE: f64 = 4.0;
/// Ceiling factor over the deadly threshold when targeting deadly encounters.
pub const DEADLY_CEILING_FACTOR: f64 = 1.5;
