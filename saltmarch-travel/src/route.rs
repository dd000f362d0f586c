//! Route planning: terrain-weighted hex paths between consecutive waypoints.

use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::hex::{HexCoordinate, hex_line, mean};
use crate::ids::{IdGenerator, IdKind};
use crate::numbers::{floor_f64_to_u32, round_f64_to_u32};
use crate::ports::TerrainLookup;
use crate::travel::TravelConfig;

/// Order assigned to the synthetic waypoint standing in for the party.
pub const START_WAYPOINT_ORDER: i32 = -1;

/// User-placed routing point. `order` is dense and 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub coord: HexCoordinate,
    pub order: i32,
}

impl Waypoint {
    #[must_use]
    pub fn new(id: impl Into<String>, coord: HexCoordinate, order: i32) -> Self {
        Self {
            id: id.into(),
            coord,
            order,
        }
    }

    /// Whether this is the synthetic start point rather than a user waypoint.
    #[must_use]
    pub const fn is_start(&self) -> bool {
        self.order == START_WAYPOINT_ORDER
    }
}

/// Leg of a route between two consecutive waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub from: Waypoint,
    pub to: Waypoint,
    /// Every hex on the leg, both ends included.
    pub path: Vec<HexCoordinate>,
    pub distance: u32,
    pub duration: Duration,
    /// Mean per-hex travel cost along `path`.
    pub terrain_multiplier: f64,
}

/// Full planned journey from the party position through every waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub waypoints: Vec<Waypoint>,
    pub segments: Vec<RouteSegment>,
    pub total_distance: u32,
    pub total_duration: Duration,
}

impl Route {
    #[must_use]
    pub fn waypoint(&self, id: &str) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| w.id == id)
    }

    /// Final waypoint coordinate, `None` for an empty route.
    #[must_use]
    pub fn destination(&self) -> Option<HexCoordinate> {
        self.waypoints.last().map(|w| w.coord)
    }

    #[must_use]
    pub fn total_minutes(&self) -> u64 {
        self.total_duration.to_minutes()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Travel time for `distance` hexes at the given terrain cost.
///
/// Fractional hours are rounded to whole minutes; a rounding that lands on 60
/// minutes becomes one more hour.
#[must_use]
pub fn calculate_duration(distance: u32, terrain_multiplier: f64, config: &TravelConfig) -> Duration {
    let speed = config.base_speed_hexes_per_hour;
    if !(speed.is_finite() && speed > 0.0) {
        log::warn!(target: "saltmarch::route", "non-positive travel speed {speed}; duration treated as zero");
        return Duration::ZERO;
    }
    let hours = f64::from(distance) * terrain_multiplier / speed;
    if !hours.is_finite() || hours <= 0.0 {
        return Duration::ZERO;
    }
    let whole = hours.floor();
    let minutes = round_f64_to_u32((hours - whole) * 60.0);
    Duration::from_hours_minutes(floor_f64_to_u32(whole), minutes)
}

/// Hex path, distance and duration between two waypoints.
#[must_use]
pub fn calculate_segment(
    from: &Waypoint,
    to: &Waypoint,
    terrain: &dyn TerrainLookup,
    config: &TravelConfig,
) -> RouteSegment {
    let path = hex_line(from.coord, to.coord);
    let distance = u32::try_from(path.len().saturating_sub(1)).unwrap_or(u32::MAX);
    let terrain_multiplier = mean(path.iter().map(|cell| {
        terrain
            .terrain_at(*cell)
            .map_or(config.default_terrain_multiplier, |t| t.travel_multiplier)
    }))
    .unwrap_or(config.default_terrain_multiplier);
    let duration = calculate_duration(distance, terrain_multiplier, config);

    RouteSegment {
        from: from.clone(),
        to: to.clone(),
        path,
        distance,
        duration,
        terrain_multiplier,
    }
}

/// Build a route from `start` through `waypoints` in order.
///
/// A fresh route id is drawn from `ids` on every call. The returned route owns
/// a copy of the waypoints and one segment per waypoint.
#[must_use]
pub fn calculate_route(
    start: HexCoordinate,
    waypoints: &[Waypoint],
    terrain: &dyn TerrainLookup,
    config: &TravelConfig,
    ids: &mut dyn IdGenerator,
) -> Route {
    let route_id = ids.next_id(IdKind::Route);
    let origin = Waypoint::new(format!("{route_id}-start"), start, START_WAYPOINT_ORDER);

    let mut segments = Vec::with_capacity(waypoints.len());
    let mut previous = &origin;
    for waypoint in waypoints {
        segments.push(calculate_segment(previous, waypoint, terrain, config));
        previous = waypoint;
    }

    let total_distance = segments
        .iter()
        .fold(0u32, |acc, s| acc.saturating_add(s.distance));
    let total_duration = segments.iter().map(|s| s.duration).sum();

    debug_assert_eq!(segments.len(), waypoints.len());
    log::debug!(
        target: "saltmarch::route",
        "route {route_id}: {} segments, {total_distance} hexes, {total_duration}",
        segments.len()
    );

    Route {
        id: route_id,
        waypoints: waypoints.to_vec(),
        segments,
        total_distance,
        total_duration,
    }
}
