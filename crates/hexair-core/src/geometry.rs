//! Planar geometry for sector membership and proximity checks.
//!
//! All coordinates are in map units (pixels); one tick of flight at
//! cruise speed covers roughly one unit.

use serde::{Deserialize, Serialize};

/// A point (or vector) in the map plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector for a heading in radians (counter-clockwise from +x).
    pub fn from_heading(heading: f64) -> Self {
        Self::new(heading.cos(), heading.sin())
    }

    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Angle of this vector in radians, as `atan2(y, x)`.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Linear interpolation: `t = 0` yields `self`, `t = 1` yields `other`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        self.add(other.sub(self).scale(t))
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    a.sub(b).length()
}

/// Distance from `point` to the segment `start..end`.
///
/// The projection parameter is clamped to `[0, 1]`, so points beyond either
/// end measure to the nearest endpoint. Returns the distance and the nearest
/// point on the segment.
pub fn point_to_segment_distance(point: Point, start: Point, end: Point) -> (f64, Point) {
    let segment = end.sub(start);
    let length_sq = segment.dot(segment);
    if length_sq <= f64::EPSILON {
        return (distance(point, start), start);
    }

    let t = (point.sub(start).dot(segment) / length_sq).clamp(0.0, 1.0);
    let nearest = start.add(segment.scale(t));
    (distance(point, nearest), nearest)
}

/// Even-odd containment test against a closed vertex ring.
///
/// The ring is implicitly closed (last vertex connects back to the first).
pub fn point_in_polygon(point: Point, ring: &[Point]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Smallest distance from `point` to any edge of a closed ring.
pub fn min_distance_to_ring(point: Point, ring: &[Point]) -> f64 {
    ring_edges(ring)
        .map(|(start, end)| point_to_segment_distance(point, start, end).0)
        .fold(f64::INFINITY, f64::min)
}

/// Iterate the edges of a closed ring, starting with `(last, first)`.
pub fn ring_edges(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[(i + n - 1) % n], ring[i]))
}
