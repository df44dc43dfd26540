//! Episode runner: alternates decision cycles and engine steps until the
//! airspace drains.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aircraft::{AircraftId, Priority};
use crate::airspace::{ActionMap, Airspace};
use crate::config::{DecisionConfig, EpisodeConfig};
use crate::decision::DecisionCycle;
use crate::error::{ConfigError, DecisionError};
use crate::planner::Planner;

/// Engine ticks per flight hour.
const TICKS_PER_HOUR: f64 = 3600.0;

/// An episode never ends before this tick.
const MIN_EPISODE_TICKS: u64 = 10;

/// Mean flight time for one priority tier and route class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTimeSummary {
    pub priority: Priority,
    pub route_class: u8,
    pub arrivals: usize,
    pub mean_ticks: f64,
}

/// Summary of one finished episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeStats {
    pub ticks: u64,
    pub reward: f64,
    /// Conflict pairs entered
    pub conflicts: u64,
    /// Aircraft lost to NMAC
    pub nmac_aircraft: u64,
    /// NMAC events (two aircraft each)
    pub nmac_events: u64,
    pub goals: u64,
    pub generated_aircraft: u64,
    /// Aircraft-ticks flown
    pub total_timesteps: u64,
    pub nmac_per_hour: f64,
    pub route_times: Vec<RouteTimeSummary>,
    /// Mean sector decision time (ms) by considered low-tier aircraft count
    pub decision_ms: BTreeMap<usize, f64>,
}

impl EpisodeStats {
    fn collect(airspace: &Airspace, reward: f64, decision_ms: BTreeMap<usize, f64>) -> Self {
        let nmac_events = airspace.nmacs() / 2;
        let route_times = [Priority::High, Priority::Low]
            .into_iter()
            .flat_map(|priority| (1..=3).map(move |class| (priority, class)))
            .filter_map(|(priority, route_class)| {
                let mean_ticks = airspace.route_times().mean(priority, route_class)?;
                let arrivals = airspace
                    .route_times()
                    .records
                    .iter()
                    .filter(|r| r.priority == priority && r.route_class == route_class)
                    .count();
                Some(RouteTimeSummary {
                    priority,
                    route_class,
                    arrivals,
                    mean_ticks,
                })
            })
            .collect();

        Self {
            ticks: airspace.tick(),
            reward,
            conflicts: airspace.conflicts(),
            nmac_aircraft: airspace.nmacs(),
            nmac_events,
            goals: airspace.goals(),
            generated_aircraft: airspace.id_tracker(),
            total_timesteps: airspace.total_timesteps(),
            nmac_per_hour: nmac_rate(nmac_events, airspace.total_timesteps()),
            route_times,
            decision_ms,
        }
    }
}

/// NMAC events per flight hour.
pub fn nmac_rate(nmac_events: u64, total_timesteps: u64) -> f64 {
    if total_timesteps == 0 {
        return 0.0;
    }
    nmac_events as f64 / (total_timesteps as f64 / TICKS_PER_HOUR)
}

/// Drives one [`Airspace`] through complete episodes.
pub struct EpisodeRunner {
    cycle: DecisionCycle,
    config: EpisodeConfig,
}

impl EpisodeRunner {
    pub fn new(
        decision: DecisionConfig,
        episode: EpisodeConfig,
        minimum_separation: f64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            cycle: DecisionCycle::new(decision, minimum_separation)?,
            config: episode,
        })
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Reset the airspace and run until it drains or the tick cap is hit.
    ///
    /// Spawning stops once more than `max_generated_aircraft` aircraft have
    /// been generated; the episode ends when the drain leaves no aircraft.
    pub fn run_episode<P: Planner + ?Sized>(
        &mut self,
        airspace: &mut Airspace,
        planner: &mut P,
    ) -> Result<EpisodeStats, DecisionError> {
        self.cycle.clear_timings();
        let mut observation = airspace.reset();
        let mut min_separation: BTreeMap<AircraftId, f64> = BTreeMap::new();
        let mut near_end = false;
        let mut reward = 0.0;

        loop {
            let actions = if self.cycle.is_due(airspace.tick()) {
                self.cycle.decide(planner, &observation, &min_separation)?
            } else {
                ActionMap::new()
            };

            let result = airspace.step(&actions, near_end);
            reward += result.reward;
            observation = result.observation;
            min_separation = result.min_separation;

            if !near_end && airspace.id_tracker() > self.config.max_generated_aircraft {
                near_end = true;
                tracing::info!(generated = airspace.id_tracker(), "spawn limit reached, draining");
            }

            let tick = airspace.tick();
            if self.config.progress_interval > 0 && tick % self.config.progress_interval == 0 {
                log_progress(airspace);
            }

            if near_end && tick > MIN_EPISODE_TICKS && airspace.num_aircraft() == 0 {
                break;
            }
            if self.config.max_ticks.is_some_and(|cap| tick >= cap) {
                tracing::info!(tick, live = airspace.num_aircraft(), "tick cap reached");
                break;
            }
        }

        let stats = EpisodeStats::collect(airspace, reward, self.cycle.mean_decision_ms());
        tracing::info!(
            ticks = stats.ticks,
            conflicts = stats.conflicts,
            nmacs = stats.nmac_events,
            goals = stats.goals,
            generated = stats.generated_aircraft,
            "episode finished"
        );
        Ok(stats)
    }
}

fn log_progress(airspace: &Airspace) {
    let nmac_events = airspace.nmacs() / 2;
    tracing::info!(
        tick = airspace.tick(),
        live = airspace.num_aircraft(),
        generated = airspace.id_tracker(),
        conflicts = airspace.conflicts(),
        nmacs = nmac_events,
        nmac_per_hour = nmac_rate(nmac_events, airspace.total_timesteps()),
        "progress"
    );
    for priority in [Priority::High, Priority::Low] {
        for route_class in 1..=3u8 {
            if let Some(mean) = airspace.route_times().mean(priority, route_class) {
                tracing::info!(?priority, route_class, mean_ticks = mean, "route time");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::planner::{HoldPlanner, LookaheadPlanner};

    /// No noise, so held headings fly straight to the goal.
    fn quiet_config() -> SimConfig {
        SimConfig {
            speed_sigma: 0.0,
            heading_sigma: 0.0,
            ..SimConfig::default()
        }
    }

    fn runner(max_generated_aircraft: u64, max_ticks: Option<u64>) -> EpisodeRunner {
        let episode = EpisodeConfig {
            max_generated_aircraft,
            max_ticks,
            progress_interval: 100,
        };
        EpisodeRunner::new(DecisionConfig::default(), episode, quiet_config().minimum_separation).unwrap()
    }

    #[test]
    fn nmac_rate_handles_empty_episode() {
        assert_eq!(nmac_rate(3, 0), 0.0);
        assert!((nmac_rate(1, 7200) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn episode_drains_after_spawn_limit() {
        let mut airspace = Airspace::new(quiet_config(), 7).unwrap();
        let mut runner = runner(4, Some(20_000));
        let stats = runner.run_episode(&mut airspace, &mut HoldPlanner).unwrap();

        assert_eq!(airspace.num_aircraft(), 0);
        assert!(stats.ticks < 20_000);
        // Spawning stops in the tick the limit is crossed; at most one
        // aircraft per vertiport is admitted in that tick.
        assert!(stats.generated_aircraft > 4);
        assert!(stats.generated_aircraft <= 4 + 7);
        assert_eq!(stats.goals + stats.nmac_aircraft, stats.generated_aircraft);
        assert_eq!(stats.nmac_events * 2, stats.nmac_aircraft);
        let arrivals: usize = stats.route_times.iter().map(|r| r.arrivals).sum();
        assert_eq!(arrivals as u64, stats.goals);
    }

    #[test]
    fn tick_cap_ends_episode() {
        let mut airspace = Airspace::new(quiet_config(), 3).unwrap();
        let mut runner = runner(10_000, Some(50));
        let stats = runner.run_episode(&mut airspace, &mut HoldPlanner).unwrap();
        assert_eq!(stats.ticks, 50);
    }

    #[test]
    fn lookahead_planner_drives_episode() {
        let config = quiet_config();
        let mut planner = LookaheadPlanner::from_config(&config);
        let mut airspace = Airspace::new(config, 11).unwrap();
        let mut runner = runner(3, Some(2_000));
        let stats = runner.run_episode(&mut airspace, &mut planner).unwrap();
        assert!(stats.ticks <= 2_000);
        assert!(stats.generated_aircraft > 0);
        assert!(!stats.decision_ms.is_empty());
        assert!(stats.total_timesteps > 0);
    }

    #[test]
    fn stats_serialize_to_json() {
        let mut airspace = Airspace::new(quiet_config(), 5).unwrap();
        let mut runner = runner(10_000, Some(20));
        let stats = runner.run_episode(&mut airspace, &mut HoldPlanner).unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["ticks"], 20);
        assert!(json["decision_ms"].is_object());
    }
}
