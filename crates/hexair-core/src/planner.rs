//! Planner contract consumed by the decision cycle.
//!
//! The engine never calls a planner itself. The decision cycle builds one
//! [`PlanRequest`] per aircraft and asks a [`Planner`] for a single action.

use crate::aircraft::{Action, AircraftId, FeatureRow};
use crate::config::{SearchBudget, SimConfig};
use crate::geometry::{distance, Point};
use crate::sector::{ExitId, SectorId};

/// Everything a planner may look at for one decision.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    /// Feature rows of every aircraft in the tier's matrix
    pub features: &'a [FeatureRow],
    /// Row of the aircraft being planned
    pub index: usize,
    /// Aircraft under consideration in this tier (leading rows of `features`)
    pub considered: &'a [AircraftId],
    /// Provisional action of every row; fixed context for other aircraft
    pub provisional: &'a [Action],
    pub sector_id: SectorId,
    pub goal_exit_id: ExitId,
}

/// A decision procedure choosing one action per request.
pub trait Planner {
    fn plan(&mut self, request: &PlanRequest<'_>, budget: SearchBudget) -> Action;
}

/// Planner that always holds; useful as a baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldPlanner;

impl Planner for HoldPlanner {
    fn plan(&mut self, _request: &PlanRequest<'_>, _budget: SearchBudget) -> Action {
        Action::Hold
    }
}

/// Deterministic short-horizon rollout over the three candidate actions.
///
/// Every row is propagated `budget.depth` ticks at constant speed: its
/// provisional action on the first tick, hold afterwards. A candidate pays
/// `conflict_penalty` for every tick another row is within minimum
/// separation and is finally scored by its distance to the sub-goal. Hold is
/// evaluated first so it wins ties. `budget.simulations` is not used.
#[derive(Debug, Clone)]
pub struct LookaheadPlanner {
    d_heading: f64,
    minimum_separation: f64,
    conflict_penalty: f64,
}

impl LookaheadPlanner {
    pub fn new(d_heading: f64, minimum_separation: f64, conflict_penalty: f64) -> Self {
        Self {
            d_heading,
            minimum_separation,
            conflict_penalty,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.d_heading, config.minimum_separation, config.conflict_penalty)
    }

    fn evaluate(&self, request: &PlanRequest<'_>, candidate: Action, depth: u32) -> f64 {
        let mut rows: Vec<(Point, f64, f64)> = request
            .features
            .iter()
            .map(|row| (row.position(), row.heading, row.speed))
            .collect();

        let mut value = 0.0;
        for tick in 0..depth.max(1) {
            for (index, (position, heading, speed)) in rows.iter_mut().enumerate() {
                if tick == 0 {
                    let action = if index == request.index {
                        candidate
                    } else {
                        request.provisional.get(index).copied().unwrap_or_default()
                    };
                    *heading += action.offset() * self.d_heading;
                }
                *position = position.add(Point::from_heading(*heading).scale(*speed));
            }

            let own = rows[request.index].0;
            let intruded = rows
                .iter()
                .enumerate()
                .any(|(index, (other, _, _))| index != request.index && distance(own, *other) < self.minimum_separation);
            if intruded {
                value += self.conflict_penalty;
            }
        }

        let sub_goal = request.features[request.index].sub_goal();
        value - distance(rows[request.index].0, sub_goal)
    }
}

impl Planner for LookaheadPlanner {
    fn plan(&mut self, request: &PlanRequest<'_>, budget: SearchBudget) -> Action {
        if request.index >= request.features.len() {
            return Action::Hold;
        }

        let mut best = (Action::Hold, self.evaluate(request, Action::Hold, budget.depth));
        for candidate in [Action::TurnRight, Action::TurnLeft] {
            let value = self.evaluate(request, candidate, budget.depth);
            if value > best.1 {
                best = (candidate, value);
            }
        }
        best.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(x: f64, y: f64, heading: f64, goal: Point) -> FeatureRow {
        FeatureRow {
            x,
            y,
            vx: heading.cos(),
            vy: heading.sin(),
            speed: 1.0,
            heading,
            sub_goal_x: goal.x,
            sub_goal_y: goal.y,
        }
    }

    fn planner() -> LookaheadPlanner {
        LookaheadPlanner::new(10.0_f64.to_radians(), 5.0, -5.0)
    }

    const BUDGET: SearchBudget = SearchBudget { simulations: 1, depth: 3 };

    #[test]
    fn turns_toward_sub_goal() {
        // Sub-goal is up and to the right of a +x heading: turn left.
        let features = [row(0.0, 0.0, 0.0, Point::new(10.0, 10.0))];
        let provisional = [Action::Hold];
        let ids = [AircraftId(0)];
        let request = PlanRequest {
            features: &features,
            index: 0,
            considered: &ids,
            provisional: &provisional,
            sector_id: SectorId(0),
            goal_exit_id: ExitId::Direct,
        };
        assert_eq!(planner().plan(&request, BUDGET), Action::TurnLeft);
    }

    #[test]
    fn holds_when_on_course() {
        let features = [row(0.0, 0.0, 0.0, Point::new(50.0, 0.0))];
        let provisional = [Action::Hold];
        let ids = [AircraftId(0)];
        let request = PlanRequest {
            features: &features,
            index: 0,
            considered: &ids,
            provisional: &provisional,
            sector_id: SectorId(0),
            goal_exit_id: ExitId::Direct,
        };
        assert_eq!(planner().plan(&request, BUDGET), Action::Hold);
    }

    #[test]
    fn avoids_intruder_ahead() {
        // Intruder sits ahead and slightly left of the straight track.
        let goal = Point::new(100.0, 0.0);
        let features = [
            row(0.0, 0.0, 0.0, goal),
            row(8.0, 2.0, std::f64::consts::PI, Point::new(-100.0, 2.0)),
        ];
        let provisional = [Action::Hold, Action::Hold];
        let ids = [AircraftId(0)];
        let request = PlanRequest {
            features: &features,
            index: 0,
            considered: &ids,
            provisional: &provisional,
            sector_id: SectorId(0),
            goal_exit_id: ExitId::Direct,
        };
        let chosen = LookaheadPlanner::new(30.0_f64.to_radians(), 5.0, -50.0).plan(&request, BUDGET);
        assert_eq!(chosen, Action::TurnRight);
    }

    #[test]
    fn hold_planner_always_holds() {
        let features = [row(0.0, 0.0, 0.0, Point::new(10.0, 10.0))];
        let request = PlanRequest {
            features: &features,
            index: 0,
            considered: &[],
            provisional: &[],
            sector_id: SectorId(2),
            goal_exit_id: ExitId::Gate(1),
        };
        assert_eq!(HoldPlanner.plan(&request, BUDGET), Action::Hold);
    }
}
