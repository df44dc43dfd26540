//! Per-sector observations handed from the engine to the decision cycle.

use serde::Serialize;

use crate::aircraft::{Aircraft, AircraftId, FeatureRow, Priority};
use crate::error::ObservationError;
use crate::geometry::min_distance_to_ring;
use crate::registry::AircraftRegistry;
use crate::sector::{ExitId, Sector, SectorId};

/// What one sector sees.
///
/// The first `ids.len()` feature rows are the aircraft this sector
/// controls; the remaining rows are aircraft of other sectors close to its
/// boundary. `priorities` has one entry per feature row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorObservation {
    pub sector_id: SectorId,
    pub features: Vec<FeatureRow>,
    pub ids: Vec<AircraftId>,
    pub goal_exit_ids: Vec<ExitId>,
    pub priorities: Vec<Priority>,
}

impl SectorObservation {
    pub fn empty(sector_id: SectorId) -> Self {
        Self {
            sector_id,
            features: Vec::new(),
            ids: Vec::new(),
            goal_exit_ids: Vec::new(),
            priorities: Vec::new(),
        }
    }

    fn push_controlled(&mut self, aircraft: &Aircraft) {
        self.features.push(aircraft.features());
        self.ids.push(aircraft.id);
        self.goal_exit_ids.push(aircraft.goal_exit_id);
        self.priorities.push(aircraft.priority);
    }

    fn push_neighbor(&mut self, aircraft: &Aircraft) {
        self.features.push(aircraft.features());
        self.priorities.push(aircraft.priority);
    }

    /// Number of controlled aircraft.
    pub fn controlled_count(&self) -> usize {
        self.ids.len()
    }

    /// Check that the parallel lists line up.
    pub fn validate(&self) -> Result<(), ObservationError> {
        let rows = self.features.len();
        let ids = self.ids.len();
        if ids > rows || self.goal_exit_ids.len() != ids || self.priorities.len() != rows {
            return Err(ObservationError::LengthMismatch {
                sector: self.sector_id,
                rows,
                ids,
                goal_exit_ids: self.goal_exit_ids.len(),
                priorities: self.priorities.len(),
            });
        }
        Ok(())
    }

    /// Split rows into high- and low-priority tiers.
    pub fn split_tiers(&self) -> Result<TieredObservation, ObservationError> {
        self.validate()?;

        let mut tiers = TieredObservation::default();
        for (index, (row, priority)) in self.features.iter().zip(&self.priorities).enumerate() {
            let controlled = index < self.ids.len();
            match (priority, controlled) {
                (Priority::High, true) => {
                    tiers.high_in.push(*row);
                    tiers.high_ids.push(self.ids[index]);
                    tiers.high_goal_exit_ids.push(self.goal_exit_ids[index]);
                }
                (Priority::High, false) => tiers.high_out.push(*row),
                (Priority::Low, true) => {
                    tiers.low_in.push(*row);
                    tiers.low_ids.push(self.ids[index]);
                    tiers.low_goal_exit_ids.push(self.goal_exit_ids[index]);
                }
                (Priority::Low, false) => tiers.low_out.push(*row),
            }
        }
        Ok(tiers)
    }
}

/// A sector observation split by decision tier.
///
/// `*_in` rows are controlled by the sector, `*_out` rows are boundary
/// neighbours from other sectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TieredObservation {
    pub high_in: Vec<FeatureRow>,
    pub high_ids: Vec<AircraftId>,
    pub high_goal_exit_ids: Vec<ExitId>,
    pub high_out: Vec<FeatureRow>,
    pub low_in: Vec<FeatureRow>,
    pub low_ids: Vec<AircraftId>,
    pub low_goal_exit_ids: Vec<ExitId>,
    pub low_out: Vec<FeatureRow>,
}

/// Observation of every sector, indexed by sector id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Observation {
    pub sectors: Vec<SectorObservation>,
}

impl Observation {
    pub fn sector(&self, id: SectorId) -> Option<&SectorObservation> {
        self.sectors.get(id.0)
    }

    /// Total controlled aircraft across sectors.
    pub fn controlled_count(&self) -> usize {
        self.sectors.iter().map(SectorObservation::controlled_count).sum()
    }
}

/// Assemble the observation of every sector.
///
/// Aircraft of other sectors within `lookahead_distance` of any edge of a
/// sector are appended to that sector's rows.
pub fn build_observation(
    sectors: &[Sector],
    registry: &AircraftRegistry,
    lookahead_distance: f64,
) -> Observation {
    let sectors_obs = sectors
        .iter()
        .map(|sector| {
            let mut obs = SectorObservation::empty(sector.id);
            for aircraft in sector.controlled().iter().filter_map(|id| registry.get(*id)) {
                obs.push_controlled(aircraft);
            }

            for other in sectors.iter().filter(|other| other.id != sector.id) {
                for aircraft in other.controlled().iter().filter_map(|id| registry.get(*id)) {
                    if min_distance_to_ring(aircraft.position, sector.vertices()) < lookahead_distance {
                        obs.push_neighbor(aircraft);
                    }
                }
            }
            obs
        })
        .collect();

    Observation {
        sectors: sectors_obs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::Aircraft;
    use crate::geometry::Point;
    use crate::layout::sector_vertices;

    fn row(x: f64) -> FeatureRow {
        FeatureRow {
            x,
            y: 0.0,
            vx: 1.0,
            vy: 0.0,
            speed: 1.0,
            heading: 0.0,
            sub_goal_x: 0.0,
            sub_goal_y: 0.0,
        }
    }

    #[test]
    fn mismatched_lengths_fail_fast() {
        let obs = SectorObservation {
            sector_id: SectorId(3),
            features: vec![row(0.0)],
            ids: vec![AircraftId(0), AircraftId(1)],
            goal_exit_ids: vec![ExitId::Direct, ExitId::Direct],
            priorities: vec![Priority::Low],
        };
        assert!(matches!(
            obs.validate(),
            Err(ObservationError::LengthMismatch { rows: 1, ids: 2, .. })
        ));
        assert!(obs.split_tiers().is_err());
    }

    #[test]
    fn split_tiers_partitions_rows() {
        let obs = SectorObservation {
            sector_id: SectorId(0),
            features: vec![row(0.0), row(1.0), row(2.0), row(3.0), row(4.0)],
            ids: vec![AircraftId(10), AircraftId(11), AircraftId(12)],
            goal_exit_ids: vec![ExitId::Gate(1), ExitId::Direct, ExitId::Gate(4)],
            priorities: vec![
                Priority::Low,
                Priority::High,
                Priority::Low,
                Priority::High,
                Priority::Low,
            ],
        };
        let tiers = obs.split_tiers().unwrap();
        assert_eq!(tiers.high_ids, vec![AircraftId(11)]);
        assert_eq!(tiers.high_goal_exit_ids, vec![ExitId::Direct]);
        assert_eq!(tiers.high_in, vec![row(1.0)]);
        assert_eq!(tiers.high_out, vec![row(3.0)]);
        assert_eq!(tiers.low_ids, vec![AircraftId(10), AircraftId(12)]);
        assert_eq!(tiers.low_goal_exit_ids, vec![ExitId::Gate(1), ExitId::Gate(4)]);
        assert_eq!(tiers.low_in, vec![row(0.0), row(2.0)]);
        assert_eq!(tiers.low_out, vec![row(4.0)]);
    }

    #[test]
    fn boundary_neighbours_are_visible_to_adjacent_sector() {
        let rings = sector_vertices(Point::new(0.0, 0.0), 100.0);
        let mut sectors: Vec<Sector> = rings
            .into_iter()
            .enumerate()
            .map(|(id, ring)| Sector::new(SectorId(id), ring, 5.0))
            .collect();

        let mut registry = AircraftRegistry::new();
        // Just inside the center, next to the edge shared with ring cell 1.
        let near = Aircraft::new(
            AircraftId(0),
            Point::new(70.0, 40.0),
            Point::new(0.0, 0.0),
            1,
            0,
            1.0,
            Priority::High,
            0,
        );
        // Deep inside the center.
        let deep = Aircraft::new(
            AircraftId(1),
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            0,
            1,
            1.0,
            Priority::Low,
            0,
        );
        registry.add(near);
        registry.add(deep);
        sectors[0].controlled.insert(AircraftId(0));
        sectors[0].controlled.insert(AircraftId(1));

        let obs = build_observation(&sectors, &registry, 30.0);
        assert_eq!(obs.sectors[0].ids, vec![AircraftId(0), AircraftId(1)]);
        assert_eq!(obs.sectors[1].ids, Vec::<AircraftId>::new());
        assert_eq!(obs.sectors[1].features.len(), 1);
        assert_eq!(obs.sectors[1].priorities, vec![Priority::High]);
        assert!(obs.sectors[1].validate().is_ok());
        assert_eq!(obs.controlled_count(), 2);
        // Ring cell 4 is on the far side.
        assert!(obs.sectors[4].features.is_empty());
    }
}
