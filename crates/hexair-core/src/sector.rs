//! Sectors: hexagonal cells with exit gates and the aircraft they control.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aircraft::{Aircraft, AircraftId};
use crate::geometry::{distance, point_in_polygon, Point};

/// Fraction along a boundary edge at which its gate anchor sits.
const GATE_FRACTION: f64 = 1.0 / 3.0;

/// Sector identity; 0 is the central cell, 1..=6 the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectorId(pub usize);

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which gate an aircraft is routed through, or direct to its goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitId {
    /// Goal lies inside the current sector
    #[default]
    Direct,
    /// Index into the owning sector's gate list
    Gate(usize),
}

/// An exit gate on a sector boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Waypoint aircraft are routed to
    pub anchor: Point,
    /// Short stub along the edge: `[anchor, anchor - len*dir, anchor + len*dir]`
    pub stub: [Point; 3],
}

impl Gate {
    fn on_edge(start: Point, end: Point, half_len: f64) -> Self {
        let anchor = start.lerp(end, GATE_FRACTION);
        let dir = Point::from_heading(end.sub(start).angle());
        Self {
            anchor,
            stub: [
                anchor,
                anchor.sub(dir.scale(half_len)),
                anchor.add(dir.scale(half_len)),
            ],
        }
    }
}

/// One cell of the hexagonal partition.
#[derive(Debug, Clone)]
pub struct Sector {
    pub id: SectorId,
    vertices: Vec<Point>,
    exits: Vec<Gate>,
    /// Aircraft currently inside this polygon
    pub(crate) controlled: BTreeSet<AircraftId>,
    /// Aircraft that left this sector, with the tick they left
    pub(crate) exited: BTreeMap<AircraftId, u64>,
}

impl Sector {
    /// Build a sector and its gates from a six-vertex counter-clockwise ring.
    pub fn new(id: SectorId, vertices: Vec<Point>, exit_half_len: f64) -> Self {
        let exits = build_gates(id, &vertices, exit_half_len);
        Self {
            id,
            vertices,
            exits,
            controlled: BTreeSet::new(),
            exited: BTreeMap::new(),
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn exits(&self) -> &[Gate] {
        &self.exits
    }

    pub fn controlled(&self) -> &BTreeSet<AircraftId> {
        &self.controlled
    }

    pub fn exited(&self) -> &BTreeMap<AircraftId, u64> {
        &self.exited
    }

    pub fn in_sector(&self, point: Point) -> bool {
        point_in_polygon(point, &self.vertices)
    }

    /// Route an aircraft that just entered this sector.
    ///
    /// Goals inside the sector are flown to directly. Otherwise the gate
    /// minimizing `|pos - anchor| + |anchor - goal|` becomes the sub-goal;
    /// ties keep the lowest gate index.
    pub fn assign_exit(&self, aircraft: &mut Aircraft) {
        if self.in_sector(aircraft.goal) {
            aircraft.sub_goal = aircraft.goal;
            aircraft.goal_exit_id = ExitId::Direct;
            return;
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, gate) in self.exits.iter().enumerate() {
            let total = distance(aircraft.position, gate.anchor) + distance(gate.anchor, aircraft.goal);
            if best.map_or(true, |(_, best_total)| total < best_total) {
                best = Some((index, total));
            }
        }

        if let Some((index, _)) = best {
            aircraft.sub_goal = self.exits[index].anchor;
            aircraft.goal_exit_id = ExitId::Gate(index);
        }
    }
}

fn build_gates(id: SectorId, vertices: &[Point], half_len: f64) -> Vec<Gate> {
    let n = vertices.len();
    if id.0 == 0 {
        // One gate per edge, edge i running from v[i-1] to v[i].
        (0..n)
            .map(|i| Gate::on_edge(vertices[(i + n - 1) % n], vertices[i], half_len))
            .collect()
    } else {
        // Edges facing ring neighbor s+1, the center, ring neighbor s-1.
        (id.0 + 1..id.0 + 4)
            .map(|i| Gate::on_edge(vertices[i % n], vertices[(i + 1) % n], half_len))
            .collect()
    }
}
