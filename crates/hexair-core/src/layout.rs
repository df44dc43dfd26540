//! The fixed seven-cell hexagon flower and its vertiports.
//!
//! All hexagons share the same circumradius `r` and a flat-topped
//! orientation: vertex `k` sits at angle `60k` degrees from the cell center.
//! Ring cell `s` (1..=6) is centered `sqrt(3) r` from the map center at angle
//! `60s - 30` degrees, which makes its edges starting at vertices
//! `s+1`, `s+2`, `s+3` face ring cell `s+1`, the center and ring cell `s-1`.

use std::f64::consts::FRAC_PI_3;

use crate::geometry::Point;

/// Number of sectors in the partition (center plus six ring cells).
pub const SECTOR_COUNT: usize = 7;

/// Number of vertiports: one at each cell center.
pub const VERTIPORT_COUNT: usize = 7;

const RING_COUNT: usize = 6;

/// Center of sector `id`; sector 0 is the map center.
pub fn cell_center(center: Point, radius: f64, id: usize) -> Point {
    if id == 0 {
        return center;
    }
    let angle = (60.0 * id as f64 - 30.0).to_radians();
    center.add(Point::from_heading(angle).scale(3.0_f64.sqrt() * radius))
}

/// Counter-clockwise vertex ring of a flat-topped hexagon.
pub fn hexagon(center: Point, radius: f64) -> Vec<Point> {
    (0..6)
        .map(|k| center.add(Point::from_heading(FRAC_PI_3 * k as f64).scale(radius)))
        .collect()
}

/// Vertex rings of all sectors, indexed by sector id.
pub fn sector_vertices(center: Point, radius: f64) -> Vec<Vec<Point>> {
    (0..SECTOR_COUNT)
        .map(|id| hexagon(cell_center(center, radius, id), radius))
        .collect()
}

/// Vertiport positions, indexed by vertiport id.
pub fn vertiport_positions(center: Point, radius: f64) -> Vec<Point> {
    (0..VERTIPORT_COUNT)
        .map(|id| cell_center(center, radius, id))
        .collect()
}

/// Route length class between two vertiports: the number of ring hops
/// (1, 2 or 3). Any route touching the central vertiport is class 1.
pub fn route_class(origin: usize, goal: usize) -> u8 {
    if origin == 0 || goal == 0 {
        return 1;
    }
    let diff = origin.abs_diff(goal) % RING_COUNT;
    diff.min(RING_COUNT - diff).max(1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::distance;

    #[test]
    fn neighbouring_cells_share_edges() {
        let rings = sector_vertices(Point::new(0.0, 0.0), 10.0);
        // Ring cell 1's center-facing edge (v3 -> v4) coincides with the
        // center's edge (v0 -> v1), traversed the other way.
        let ring = &rings[1];
        let core = &rings[0];
        assert!(distance(ring[3], core[1]) < 1e-9);
        assert!(distance(ring[4], core[0]) < 1e-9);
    }

    #[test]
    fn adjacent_ring_cells_touch() {
        let rings = sector_vertices(Point::new(0.0, 0.0), 10.0);
        // Ring cell 1's edge v2 -> v3 faces ring cell 2.
        let (a, b) = (&rings[1], &rings[2]);
        assert!(b.iter().any(|p| distance(*p, a[2]) < 1e-9));
        assert!(b.iter().any(|p| distance(*p, a[3]) < 1e-9));
    }

    #[test]
    fn route_classes() {
        assert_eq!(route_class(1, 2), 1);
        assert_eq!(route_class(1, 6), 1);
        assert_eq!(route_class(1, 3), 2);
        assert_eq!(route_class(2, 6), 2);
        assert_eq!(route_class(1, 4), 3);
        assert_eq!(route_class(0, 4), 1);
        assert_eq!(route_class(5, 0), 1);
    }
}
