//! Per-tick conflict, NMAC and goal-arrival scoring.
//!
//! Every live aircraft is scored against a position snapshot taken before
//! any removal, so an aircraft leaving this tick still counts for its
//! neighbours. Removal is left to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aircraft::AircraftId;
use crate::config::SimConfig;
use crate::geometry::{distance, Point};
use crate::registry::AircraftRegistry;

/// What happened to one aircraft on a tick, in decreasing precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Near mid-air collision; aircraft is removed
    Nmac,
    /// Reached its goal; aircraft is removed
    Goal,
    /// Inside minimum separation of at least one other aircraft
    Conflict,
    Clear,
}

impl Outcome {
    pub fn removes_aircraft(self) -> bool {
        matches!(self, Outcome::Nmac | Outcome::Goal)
    }
}

/// Thresholds and rewards used by [`score_tick`].
#[derive(Debug, Clone, Copy)]
pub struct ScoringRules {
    pub minimum_separation: f64,
    pub nmac_dist: f64,
    pub goal_radius: f64,
    pub conflict_penalty: f64,
    pub nmac_penalty: f64,
    pub goal_reward: f64,
    pub step_penalty: f64,
}

impl From<&SimConfig> for ScoringRules {
    fn from(config: &SimConfig) -> Self {
        Self {
            minimum_separation: config.minimum_separation,
            nmac_dist: config.nmac_dist,
            goal_radius: config.goal_radius,
            conflict_penalty: config.conflict_penalty,
            nmac_penalty: config.nmac_penalty,
            goal_reward: config.goal_reward,
            step_penalty: config.step_penalty,
        }
    }
}

/// Result of scoring one tick.
#[derive(Debug, Clone, Default)]
pub struct TickScore {
    /// Sum of all aircraft rewards
    pub reward: f64,
    /// Outcome per aircraft, in registry order
    pub outcomes: Vec<(AircraftId, Outcome)>,
    /// Distance to the nearest other aircraft (infinite when alone)
    pub min_separation: BTreeMap<AircraftId, f64>,
    /// Pairs that entered loss of separation this tick
    pub new_conflicts: u64,
    /// Aircraft lost to NMAC this tick
    pub nmacs: u64,
    pub goals: u64,
}

impl TickScore {
    /// Aircraft to remove after scoring.
    pub fn removals(&self) -> impl Iterator<Item = (AircraftId, Outcome)> + '_ {
        self.outcomes
            .iter()
            .copied()
            .filter(|(_, outcome)| outcome.removes_aircraft())
    }
}

/// Score every live aircraft and update conflict memories.
///
/// A conflicting pair is counted once, when it enters loss of separation;
/// both aircraft remember the pair until separation is restored.
pub fn score_tick(registry: &mut AircraftRegistry, rules: &ScoringRules) -> TickScore {
    let snapshot: Vec<(AircraftId, Point, Point)> = registry
        .iter()
        .map(|aircraft| (aircraft.id, aircraft.position, aircraft.goal))
        .collect();

    let mut score = TickScore::default();

    for (i, &(id, position, goal)) in snapshot.iter().enumerate() {
        let intruders: Vec<(AircraftId, f64)> = snapshot
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, &(other, other_pos, _))| (other, distance(position, other_pos)))
            .collect();
        let min_dist = intruders
            .iter()
            .map(|(_, dist)| *dist)
            .fold(f64::INFINITY, f64::min);
        score.min_separation.insert(id, min_dist);

        let (outcome, reward) = if min_dist < rules.nmac_dist {
            score.nmacs += 1;
            (Outcome::Nmac, rules.nmac_penalty)
        } else if distance(position, goal) < rules.goal_radius {
            score.goals += 1;
            (Outcome::Goal, rules.goal_reward)
        } else {
            let mut in_conflict = false;
            for &(other, dist) in &intruders {
                if dist >= rules.minimum_separation {
                    forget_pair(registry, id, other);
                } else {
                    in_conflict = true;
                    if remember_pair(registry, id, other) {
                        score.new_conflicts += 1;
                    }
                }
            }
            if in_conflict {
                (Outcome::Conflict, rules.conflict_penalty)
            } else {
                (Outcome::Clear, rules.step_penalty)
            }
        };

        if let Some(aircraft) = registry.get_mut(id) {
            aircraft.reward = reward;
        }
        score.reward += reward;
        score.outcomes.push((id, outcome));
    }

    score
}

/// Record a conflicting pair on both aircraft; true if the pair is new.
fn remember_pair(registry: &mut AircraftRegistry, a: AircraftId, b: AircraftId) -> bool {
    let is_new = registry
        .get_mut(a)
        .map(|aircraft| aircraft.conflict_ids.insert(b))
        .unwrap_or(false);
    if is_new {
        if let Some(other) = registry.get_mut(b) {
            other.conflict_ids.insert(a);
        }
    }
    is_new
}

fn forget_pair(registry: &mut AircraftRegistry, a: AircraftId, b: AircraftId) {
    if let Some(aircraft) = registry.get_mut(a) {
        aircraft.conflict_ids.remove(&b);
    }
    if let Some(other) = registry.get_mut(b) {
        other.conflict_ids.remove(&a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::{Aircraft, Priority};

    fn rules() -> ScoringRules {
        ScoringRules {
            minimum_separation: 10.0,
            nmac_dist: 2.0,
            goal_radius: 5.0,
            conflict_penalty: -5.0,
            nmac_penalty: -10.0,
            goal_reward: 10.0,
            step_penalty: -0.01,
        }
    }

    fn aircraft(id: u64, position: Point, goal: Point) -> Aircraft {
        Aircraft::new(AircraftId(id), position, goal, 1, 2, 1.0, Priority::Low, 0)
    }

    fn far_goal() -> Point {
        Point::new(1000.0, 1000.0)
    }

    #[test]
    fn lone_aircraft_pays_step_penalty() {
        let mut registry = AircraftRegistry::new();
        registry.add(aircraft(0, Point::new(0.0, 0.0), far_goal()));
        let score = score_tick(&mut registry, &rules());
        assert_eq!(score.outcomes, vec![(AircraftId(0), Outcome::Clear)]);
        assert!((score.reward + 0.01).abs() < 1e-12);
        assert!(score.min_separation[&AircraftId(0)].is_infinite());
    }

    #[test]
    fn conflict_is_counted_once_per_pair() {
        let mut registry = AircraftRegistry::new();
        registry.add(aircraft(0, Point::new(0.0, 0.0), far_goal()));
        registry.add(aircraft(1, Point::new(5.0, 0.0), far_goal()));

        let mut total = 0;
        for _ in 0..4 {
            let score = score_tick(&mut registry, &rules());
            total += score.new_conflicts;
            assert!((score.reward - 2.0 * -5.0).abs() < 1e-12);
        }
        assert_eq!(total, 1);
        assert!(registry.get(AircraftId(0)).unwrap().conflict_ids.contains(&AircraftId(1)));
        assert!(registry.get(AircraftId(1)).unwrap().conflict_ids.contains(&AircraftId(0)));
    }

    #[test]
    fn separation_restored_allows_new_conflict() {
        let mut registry = AircraftRegistry::new();
        registry.add(aircraft(0, Point::new(0.0, 0.0), far_goal()));
        registry.add(aircraft(1, Point::new(5.0, 0.0), far_goal()));
        assert_eq!(score_tick(&mut registry, &rules()).new_conflicts, 1);

        registry.get_mut(AircraftId(1)).unwrap().position = Point::new(50.0, 0.0);
        let score = score_tick(&mut registry, &rules());
        assert_eq!(score.new_conflicts, 0);
        assert!(registry.get(AircraftId(0)).unwrap().conflict_ids.is_empty());
        assert!(registry.get(AircraftId(1)).unwrap().conflict_ids.is_empty());

        registry.get_mut(AircraftId(1)).unwrap().position = Point::new(5.0, 0.0);
        assert_eq!(score_tick(&mut registry, &rules()).new_conflicts, 1);
    }

    #[test]
    fn nmac_takes_precedence_over_goal() {
        let goal = Point::new(0.0, 0.0);
        let mut registry = AircraftRegistry::new();
        registry.add(aircraft(0, Point::new(1.0, 0.0), goal));
        registry.add(aircraft(1, Point::new(0.0, 0.5), goal));

        let score = score_tick(&mut registry, &rules());
        assert_eq!(score.nmacs, 2);
        assert_eq!(score.goals, 0);
        assert!(score.outcomes.iter().all(|(_, o)| *o == Outcome::Nmac));
        assert_eq!(score.removals().count(), 2);
        assert!((score.reward + 20.0).abs() < 1e-12);
    }

    #[test]
    fn goal_arrival_scores_reward() {
        let mut registry = AircraftRegistry::new();
        registry.add(aircraft(0, Point::new(0.0, 0.0), Point::new(3.0, 0.0)));
        registry.add(aircraft(1, Point::new(100.0, 0.0), far_goal()));

        let score = score_tick(&mut registry, &rules());
        assert_eq!(score.goals, 1);
        assert_eq!(score.outcomes[0], (AircraftId(0), Outcome::Goal));
        assert_eq!(score.outcomes[1], (AircraftId(1), Outcome::Clear));
        assert!((score.reward - (10.0 - 0.01)).abs() < 1e-12);
    }

    #[test]
    fn removal_candidates_do_not_affect_same_tick_scoring() {
        // Aircraft 0 arrives; aircraft 1 is still in conflict with it this tick.
        let mut registry = AircraftRegistry::new();
        registry.add(aircraft(0, Point::new(0.0, 0.0), Point::new(1.0, 0.0)));
        registry.add(aircraft(1, Point::new(6.0, 0.0), far_goal()));

        let score = score_tick(&mut registry, &rules());
        assert_eq!(score.outcomes[0].1, Outcome::Goal);
        assert_eq!(score.outcomes[1].1, Outcome::Conflict);
        assert_eq!(score.new_conflicts, 1);
        assert!((score.min_separation[&AircraftId(1)] - 6.0).abs() < 1e-12);
    }
}
