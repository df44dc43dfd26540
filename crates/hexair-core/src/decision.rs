//! Two-tier decision cycle.
//!
//! For each sector the high-priority aircraft are planned first against each
//! other. The low-priority aircraft are then planned with the high tier's
//! chosen actions spliced into their provisional action vector, so they
//! treat those decisions as fixed.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::aircraft::{Action, AircraftId, FeatureRow, Priority};
use crate::airspace::ActionMap;
use crate::config::{DecisionConfig, SearchBudget};
use crate::error::{ConfigError, DecisionError};
use crate::observation::{Observation, SectorObservation};
use crate::planner::{PlanRequest, Planner};

pub struct DecisionCycle {
    config: DecisionConfig,
    minimum_separation: f64,
    /// Wall-clock time per sector decision, keyed by the number of
    /// low-priority aircraft considered in the sector's second tier
    timings: BTreeMap<usize, Vec<Duration>>,
}

impl DecisionCycle {
    pub fn new(config: DecisionConfig, minimum_separation: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            minimum_separation,
            timings: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Whether the cycle runs before the step that starts at `tick`.
    pub fn is_due(&self, tick: u64) -> bool {
        tick % self.config.decision_interval == 0
    }

    /// Full budget for aircraft close to a neighbour, lite otherwise.
    /// Aircraft without a recorded separation get the lite budget.
    pub fn budget_for(&self, id: AircraftId, min_separation: &BTreeMap<AircraftId, f64>) -> SearchBudget {
        let threshold = self.config.tight_separation_multiple * self.minimum_separation;
        match min_separation.get(&id) {
            Some(dist) if *dist < threshold => self.config.full_budget,
            _ => self.config.lite_budget,
        }
    }

    /// Plan every controlled aircraft of every sector.
    pub fn decide<P: Planner + ?Sized>(
        &mut self,
        planner: &mut P,
        observation: &Observation,
        min_separation: &BTreeMap<AircraftId, f64>,
    ) -> Result<ActionMap, DecisionError> {
        let mut actions = ActionMap::new();
        for sector in &observation.sectors {
            let started = Instant::now();
            let decided = self.decide_sector(planner, sector, min_separation)?;
            self.timings
                .entry(considered_low_count(sector))
                .or_default()
                .push(started.elapsed());
            for (id, action) in decided {
                actions.insert(id, action);
            }
        }
        Ok(actions)
    }

    /// Plan the controlled aircraft of one sector, high tier first.
    pub fn decide_sector<P: Planner + ?Sized>(
        &self,
        planner: &mut P,
        sector: &SectorObservation,
        min_separation: &BTreeMap<AircraftId, f64>,
    ) -> Result<Vec<(AircraftId, Action)>, DecisionError> {
        let tiers = sector.split_tiers()?;
        let mut decided = Vec::with_capacity(sector.controlled_count());

        let high_matrix: Vec<FeatureRow> = tiers.high_in.iter().chain(&tiers.high_out).copied().collect();
        let mut high_actions = vec![Action::Hold; high_matrix.len()];
        for (index, &id) in tiers.high_ids.iter().enumerate() {
            let request = PlanRequest {
                features: &high_matrix,
                index,
                considered: &tiers.high_ids,
                provisional: &high_actions,
                sector_id: sector.sector_id,
                goal_exit_id: tiers.high_goal_exit_ids[index],
            };
            let action = planner.plan(&request, self.budget_for(id, min_separation));
            high_actions[index] = action;
            decided.push((id, action));
        }

        let low_matrix: Vec<FeatureRow> = tiers
            .low_in
            .iter()
            .chain(&tiers.high_in)
            .chain(&tiers.high_out)
            .chain(&tiers.low_out)
            .copied()
            .collect();
        let offset = tiers.low_in.len();
        let mut low_actions = vec![Action::Hold; low_matrix.len()];
        low_actions[offset..offset + high_actions.len()].copy_from_slice(&high_actions);
        for (index, &id) in tiers.low_ids.iter().enumerate() {
            let request = PlanRequest {
                features: &low_matrix,
                index,
                considered: &tiers.low_ids,
                provisional: &low_actions,
                sector_id: sector.sector_id,
                goal_exit_id: tiers.low_goal_exit_ids[index],
            };
            let action = planner.plan(&request, self.budget_for(id, min_separation));
            low_actions[index] = action;
            decided.push((id, action));
        }

        Ok(decided)
    }

    pub fn timings(&self) -> &BTreeMap<usize, Vec<Duration>> {
        &self.timings
    }

    pub fn clear_timings(&mut self) {
        self.timings.clear();
    }

    /// Mean sector decision time in milliseconds per considered low-tier count.
    pub fn mean_decision_ms(&self) -> BTreeMap<usize, f64> {
        self.timings
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(count, samples)| {
                let total: Duration = samples.iter().sum();
                (*count, total.as_secs_f64() * 1000.0 / samples.len() as f64)
            })
            .collect()
    }
}

/// Controlled aircraft of the low tier.
fn considered_low_count(sector: &SectorObservation) -> usize {
    sector
        .priorities
        .iter()
        .take(sector.controlled_count())
        .filter(|priority| **priority == Priority::Low)
        .count()
}
