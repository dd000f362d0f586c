//! Maps elapsed game minutes onto a route.

use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::hex::{HexCoordinate, PixelPoint, hex_to_pixel};
use crate::numbers::{floor_f64_to_index, floor_f64_to_u32, u64_to_f64, usize_to_f64};
use crate::route::{Route, RouteSegment};

/// Where the party is along the active route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelProgress {
    /// Fraction of the whole route covered, in `[0, 1]`.
    pub overall_progress: f64,
    pub current_segment_index: usize,
    /// Fraction of the current segment covered, in `[0, 1]`.
    pub segment_progress: f64,
    /// Last path node reached; lags `pixel_position` between nodes.
    pub current_coord: HexCoordinate,
    pub pixel_position: PixelPoint,
    pub elapsed_duration: Duration,
    pub remaining_duration: Duration,
}

impl TravelProgress {
    /// Progress at the very start of a journey from `start`.
    #[must_use]
    pub fn starting_at(start: HexCoordinate, route: &Route, hex_size: f64) -> Self {
        Self {
            overall_progress: 0.0,
            current_segment_index: 0,
            segment_progress: 0.0,
            current_coord: start,
            pixel_position: hex_to_pixel(start, hex_size),
            elapsed_duration: Duration::ZERO,
            remaining_duration: route.total_duration,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.overall_progress >= 1.0
    }
}

/// Interpolate the party position after `elapsed_minutes` of travel.
///
/// An empty route resolves to `start` with full progress.
#[must_use]
pub fn interpolate(route: &Route, start: HexCoordinate, elapsed_minutes: f64, hex_size: f64) -> TravelProgress {
    let total_minutes = route.total_minutes();
    let total = u64_to_f64(total_minutes);
    let elapsed = if elapsed_minutes.is_finite() {
        elapsed_minutes.max(0.0)
    } else {
        0.0
    };
    let overall_progress = if total_minutes == 0 {
        1.0
    } else {
        (elapsed / total).clamp(0.0, 1.0)
    };

    let elapsed_whole = u64::from(floor_f64_to_u32(elapsed)).min(total_minutes);
    let elapsed_duration = Duration::from_total_minutes(elapsed_whole);
    let remaining_duration = Duration::from_total_minutes(total_minutes - elapsed_whole);

    let Some((index, segment_progress)) = locate_segment(&route.segments, elapsed) else {
        return TravelProgress {
            overall_progress,
            current_segment_index: 0,
            segment_progress: 1.0,
            current_coord: start,
            pixel_position: hex_to_pixel(start, hex_size),
            elapsed_duration,
            remaining_duration,
        };
    };

    let (current_coord, pixel_position) = position_on_path(&route.segments[index].path, segment_progress, hex_size);

    TravelProgress {
        overall_progress,
        current_segment_index: index,
        segment_progress,
        current_coord,
        pixel_position,
        elapsed_duration,
        remaining_duration,
    }
}

/// First segment whose cumulative end is at or past `elapsed`, with the
/// fraction of it already covered. Overshooting lands at the end of the last
/// segment.
fn locate_segment(segments: &[RouteSegment], elapsed: f64) -> Option<(usize, f64)> {
    let mut cumulative = 0u64;
    for (index, segment) in segments.iter().enumerate() {
        let minutes = segment.duration.to_minutes();
        let before = cumulative;
        cumulative = cumulative.saturating_add(minutes);
        if u64_to_f64(cumulative) >= elapsed {
            let progress = if minutes == 0 {
                1.0
            } else {
                ((elapsed - u64_to_f64(before)) / u64_to_f64(minutes)).clamp(0.0, 1.0)
            };
            return Some((index, progress));
        }
    }
    segments.len().checked_sub(1).map(|last| (last, 1.0))
}

fn position_on_path(path: &[HexCoordinate], progress: f64, hex_size: f64) -> (HexCoordinate, PixelPoint) {
    let Some(&last) = path.last() else {
        return (HexCoordinate::ORIGIN, PixelPoint::default());
    };
    let span = usize_to_f64(path.len() - 1);
    let p = progress * span;
    let index = floor_f64_to_index(p, path.len());
    let fraction = (p - usize_to_f64(index)).clamp(0.0, 1.0);
    let coord = path[index];
    let next = path.get(index + 1).copied().unwrap_or(last);
    let pixel = hex_to_pixel(coord, hex_size).lerp(hex_to_pixel(next, hex_size), fraction);
    (coord, pixel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::ports::UnmappedTerrain;
    use crate::route::{Waypoint, calculate_route};
    use crate::travel::TravelConfig;

    fn straight_route(hexes: i32) -> Route {
        let mut ids = SequentialIds::new();
        calculate_route(
            HexCoordinate::ORIGIN,
            &[Waypoint::new("w0", HexCoordinate::new(hexes, 0), 0)],
            &UnmappedTerrain,
            &TravelConfig::default(),
            &mut ids,
        )
    }

    #[test]
    fn halfway_along_single_segment() {
        let route = straight_route(6);
        let p = interpolate(&route, HexCoordinate::ORIGIN, 60.0, 42.0);
        assert!((p.overall_progress - 0.5).abs() < 1e-9);
        assert_eq!(p.current_segment_index, 0);
        assert_eq!(p.current_coord, HexCoordinate::new(3, 0));
        assert_eq!(p.elapsed_duration.to_minutes(), 60);
        assert_eq!(p.remaining_duration.to_minutes(), 60);
    }

    #[test]
    fn coord_lags_pixel_between_nodes() {
        let route = straight_route(6);
        // 30 minutes = 1.5 hexes
        let p = interpolate(&route, HexCoordinate::ORIGIN, 30.0, 42.0);
        assert_eq!(p.current_coord, HexCoordinate::new(1, 0));
        let one = hex_to_pixel(HexCoordinate::new(1, 0), 42.0);
        let two = hex_to_pixel(HexCoordinate::new(2, 0), 42.0);
        assert!((p.pixel_position.x - (one.x + two.x) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn overshoot_clamps_to_destination() {
        let route = straight_route(3);
        let p = interpolate(&route, HexCoordinate::ORIGIN, 10_000.0, 42.0);
        assert!(p.is_complete());
        assert!((p.segment_progress - 1.0).abs() < 1e-9);
        assert_eq!(p.current_coord, HexCoordinate::new(3, 0));
        assert!(p.remaining_duration.is_zero());
    }

    #[test]
    fn empty_route_resolves_to_start() {
        let mut ids = SequentialIds::new();
        let start = HexCoordinate::new(2, -1);
        let route = calculate_route(start, &[], &UnmappedTerrain, &TravelConfig::default(), &mut ids);
        let p = interpolate(&route, start, 0.0, 42.0);
        assert_eq!(p.current_coord, start);
        assert!(p.is_complete());
    }

    #[test]
    fn second_segment_is_located_by_cumulative_minutes() {
        let mut ids = SequentialIds::new();
        let route = calculate_route(
            HexCoordinate::ORIGIN,
            &[
                Waypoint::new("w0", HexCoordinate::new(3, 0), 0),
                Waypoint::new("w1", HexCoordinate::new(3, 3), 1),
            ],
            &UnmappedTerrain,
            &TravelConfig::default(),
            &mut ids,
        );
        let p = interpolate(&route, HexCoordinate::ORIGIN, 90.0, 42.0);
        assert_eq!(p.current_segment_index, 1);
        assert!((p.segment_progress - 0.5).abs() < 1e-9);
        assert_eq!(p.current_coord, HexCoordinate::new(3, 1));
    }
}
