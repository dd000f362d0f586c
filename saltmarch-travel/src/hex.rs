//! Hex-grid geometry on axial coordinates.
//!
//! Coordinates are stored as axial `(q, r)`; the cube form adds the implicit
//! `s = -q - r` axis and is only used inside the algorithms below. Pixel
//! projection assumes pointy-top hexes.
//!
//! Maps are expected to stay well inside `±2^30` on each axis. Beyond that the
//! coordinate arithmetic saturates instead of overflowing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use crate::numbers::{round_f64_to_i32, usize_to_f64};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Nudge applied to line endpoints so interpolated points never land exactly
/// on a hex edge.
const LINE_EPSILON: (f64, f64) = (1e-6, 2e-6);

/// Axial hex coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HexCoordinate {
    pub q: i32,
    pub r: i32,
}

impl HexCoordinate {
    pub const ORIGIN: Self = Self { q: 0, r: 0 };

    /// The six axial neighbour offsets, starting east and turning counter-clockwise.
    pub const DIRECTIONS: [Self; 6] = [
        Self { q: 1, r: 0 },
        Self { q: 1, r: -1 },
        Self { q: 0, r: -1 },
        Self { q: -1, r: 0 },
        Self { q: -1, r: 1 },
        Self { q: 0, r: 1 },
    ];

    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Implicit third cube axis.
    #[must_use]
    pub const fn s(self) -> i32 {
        0_i32.saturating_sub(self.q).saturating_sub(self.r)
    }

    #[must_use]
    pub const fn to_cube(self) -> CubeCoordinate {
        CubeCoordinate {
            q: self.q,
            r: self.r,
            s: self.s(),
        }
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> u32 {
        distance(self, other)
    }

    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        Self::DIRECTIONS.map(|d| self + d)
    }
}

impl Add for HexCoordinate {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.q.saturating_add(other.q), self.r.saturating_add(other.r))
    }
}

impl Sub for HexCoordinate {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.q.saturating_sub(other.q), self.r.saturating_sub(other.r))
    }
}

impl fmt::Display for HexCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Cube coordinate; `q + r + s == 0` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeCoordinate {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl CubeCoordinate {
    #[must_use]
    pub const fn to_axial(self) -> HexCoordinate {
        HexCoordinate::new(self.q, self.r)
    }
}

impl From<HexCoordinate> for CubeCoordinate {
    fn from(value: HexCoordinate) -> Self {
        value.to_cube()
    }
}

impl From<CubeCoordinate> for HexCoordinate {
    fn from(value: CubeCoordinate) -> Self {
        value.to_axial()
    }
}

/// Screen-space position produced by [`hex_to_pixel`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `other`; `t` is not clamped.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Hex-grid distance: the largest absolute delta over the three cube axes.
#[must_use]
pub fn distance(a: HexCoordinate, b: HexCoordinate) -> u32 {
    let dq = a.q.abs_diff(b.q);
    let dr = a.r.abs_diff(b.r);
    let ds = (i64::from(a.q) + i64::from(a.r) - i64::from(b.q) - i64::from(b.r)).unsigned_abs();
    u32::try_from(ds).unwrap_or(u32::MAX).max(dq).max(dr)
}

/// All coordinates within `radius` steps of `center`, `3r² + 3r + 1` in total.
#[must_use]
pub fn hexes_in_radius(center: HexCoordinate, radius: u32) -> Vec<HexCoordinate> {
    let n = i32::try_from(radius).unwrap_or(i32::MAX / 2);
    let mut cells = Vec::with_capacity(cell_count(radius));
    for dq in -n..=n {
        let lo = (-n).max(-dq - n);
        let hi = n.min(-dq + n);
        for dr in lo..=hi {
            cells.push(HexCoordinate::new(center.q + dq, center.r + dr));
        }
    }
    cells
}

fn cell_count(radius: u32) -> usize {
    let r = usize::try_from(radius).unwrap_or(0);
    r.saturating_mul(r)
        .saturating_add(r)
        .saturating_mul(3)
        .saturating_add(1)
}

/// Round fractional cube components to the nearest valid cube coordinate.
///
/// The axis whose rounding moved it furthest is recomputed from the other two
/// so the result keeps `q + r + s == 0`.
#[must_use]
pub fn cube_round(q: f64, r: f64, s: f64) -> CubeCoordinate {
    let mut rq = q.round();
    let mut rr = r.round();
    let mut rs = s.round();

    let dq = (rq - q).abs();
    let dr = (rr - r).abs();
    let ds = (rs - s).abs();

    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    } else {
        rs = -rq - rr;
    }

    CubeCoordinate {
        q: round_f64_to_i32(rq),
        r: round_f64_to_i32(rr),
        s: round_f64_to_i32(rs),
    }
}

/// Discretised straight line from `a` to `b`, inclusive of both ends.
///
/// The result has `distance(a, b) + 1` entries and every consecutive pair is
/// adjacent.
#[must_use]
pub fn hex_line(a: HexCoordinate, b: HexCoordinate) -> Vec<HexCoordinate> {
    let n = distance(a, b);
    if n == 0 {
        return vec![a];
    }

    let (eq, er) = LINE_EPSILON;
    let start = (f64::from(a.q) + eq, f64::from(a.r) + er);
    let end = (f64::from(b.q) + eq, f64::from(b.r) + er);
    let steps = f64::from(n);

    let mut path = Vec::with_capacity(usize::try_from(n).unwrap_or(0) + 1);
    for i in 0..=n {
        let t = f64::from(i) / steps;
        let q = start.0 + (end.0 - start.0) * t;
        let r = start.1 + (end.1 - start.1) * t;
        path.push(cube_round(q, r, -q - r).to_axial());
    }
    path
}

/// Pixel centre of `coord` for pointy-top hexes of the given `size`.
#[must_use]
pub fn hex_to_pixel(coord: HexCoordinate, size: f64) -> PixelPoint {
    let q = f64::from(coord.q);
    let r = f64::from(coord.r);
    PixelPoint {
        x: size * (SQRT_3 * q + SQRT_3 / 2.0 * r),
        y: size * (1.5 * r),
    }
}

/// Hex containing `point` for pointy-top hexes of the given `size`.
#[must_use]
pub fn pixel_to_hex(point: PixelPoint, size: f64) -> HexCoordinate {
    if size <= 0.0 {
        return HexCoordinate::ORIGIN;
    }
    let q = (SQRT_3 / 3.0 * point.x - point.y / 3.0) / size;
    let r = (2.0 / 3.0 * point.y) / size;
    cube_round(q, r, -q - r).to_axial()
}

/// Mean of `values`, `None` for an empty iterator.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / usize_to_f64(count))
}
