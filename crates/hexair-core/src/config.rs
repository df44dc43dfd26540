//! Simulation parameters: separation standards, kinematics, spawning and rewards.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Point;

/// Meters represented by one map unit in the default parameter set.
const DEFAULT_SCALE: f64 = 60.0;

/// Configuration for the airspace engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Center of the central sector in map units
    pub map_center: Point,
    /// Circumradius of every sector hexagon in map units
    pub hex_radius: f64,
    /// Loss-of-separation threshold
    pub minimum_separation: f64,
    /// Near mid-air collision threshold
    pub nmac_dist: f64,
    /// Distance at which an aircraft counts as arrived
    pub goal_radius: f64,
    /// A new aircraft must be farther than this from every live aircraft
    pub start_safe_dist: f64,
    /// Cruise speed (map units per tick)
    pub init_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Std dev of the per-tick speed noise
    pub speed_sigma: f64,
    /// Std dev of the per-tick heading noise (radians)
    pub heading_sigma: f64,
    /// Heading change applied by one turn action (radians)
    pub d_heading: f64,
    /// First spawn threshold of each vertiport is drawn from `[0, initial_spawn_window)`
    pub initial_spawn_window: f64,
    /// Later spawn thresholds are drawn from `[time_interval_lower, time_interval_upper)`
    pub time_interval_lower: f64,
    pub time_interval_upper: f64,
    /// Half length of an exit gate stub
    pub sector_exit_len: f64,
    pub conflict_penalty: f64,
    pub nmac_penalty: f64,
    pub goal_reward: f64,
    pub step_penalty: f64,
    /// Aircraft of other sectors closer than `multiple * minimum_separation`
    /// to a sector boundary are included in that sector's observation
    pub observation_lookahead_multiple: f64,
    /// Probability that a spawned aircraft is high priority
    pub high_priority_probability: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            map_center: Point::new(500.0, 500.0),
            hex_radius: 180.0,
            minimum_separation: 555.0 / DEFAULT_SCALE, // ~0.3 nmi
            nmac_dist: 150.0 / DEFAULT_SCALE,          // ~500 ft
            goal_radius: 600.0 / DEFAULT_SCALE,
            start_safe_dist: 3.0 * 555.0 / DEFAULT_SCALE,
            init_speed: 60.0 / DEFAULT_SCALE,
            min_speed: 50.0 / DEFAULT_SCALE,
            max_speed: 80.0 / DEFAULT_SCALE,
            speed_sigma: 2.0 / DEFAULT_SCALE,
            heading_sigma: 2.0_f64.to_radians(),
            d_heading: 5.0_f64.to_radians(),
            initial_spawn_window: 60.0,
            time_interval_lower: 60.0,
            time_interval_upper: 180.0,
            sector_exit_len: 10.0,
            conflict_penalty: -5.0,
            nmac_penalty: -10.0,
            goal_reward: 10.0,
            step_penalty: -0.01,
            observation_lookahead_multiple: 3.0,
            high_priority_probability: 0.5,
        }
    }
}

impl SimConfig {
    /// Reject parameter sets the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("hex_radius", self.hex_radius)?;
        positive("minimum_separation", self.minimum_separation)?;
        positive("nmac_dist", self.nmac_dist)?;
        positive("goal_radius", self.goal_radius)?;
        positive("init_speed", self.init_speed)?;
        positive("min_speed", self.min_speed)?;
        positive("max_speed", self.max_speed)?;
        non_negative("d_heading", self.d_heading)?;
        positive("initial_spawn_window", self.initial_spawn_window)?;
        non_negative("start_safe_dist", self.start_safe_dist)?;
        non_negative("speed_sigma", self.speed_sigma)?;
        non_negative("heading_sigma", self.heading_sigma)?;
        non_negative("sector_exit_len", self.sector_exit_len)?;
        non_negative("observation_lookahead_multiple", self.observation_lookahead_multiple)?;

        if self.min_speed > self.max_speed {
            return Err(ConfigError::SpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if !(self.time_interval_lower >= 0.0
            && self.time_interval_upper.is_finite()
            && self.time_interval_lower < self.time_interval_upper)
        {
            return Err(ConfigError::SpawnInterval {
                lower: self.time_interval_lower,
                upper: self.time_interval_upper,
            });
        }
        if self.nmac_dist >= self.minimum_separation {
            return Err(ConfigError::NmacNotStricter {
                nmac: self.nmac_dist,
                separation: self.minimum_separation,
            });
        }
        if !(0.0..=1.0).contains(&self.high_priority_probability) {
            return Err(ConfigError::Probability(self.high_priority_probability));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Search effort handed to the planner for one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBudget {
    pub simulations: u32,
    pub depth: u32,
}

/// Parameters of the two-tier decision cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Plan every `decision_interval` ticks; aircraft hold in between
    pub decision_interval: u64,
    /// Use the full budget when the nearest neighbor is closer than
    /// `multiple * minimum_separation`
    pub tight_separation_multiple: f64,
    pub full_budget: SearchBudget,
    pub lite_budget: SearchBudget,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            decision_interval: 5,
            tight_separation_multiple: 5.0,
            full_budget: SearchBudget { simulations: 100, depth: 3 },
            lite_budget: SearchBudget { simulations: 30, depth: 2 },
        }
    }
}

impl DecisionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decision_interval == 0 {
            return Err(ConfigError::DecisionInterval);
        }
        non_negative("tight_separation_multiple", self.tight_separation_multiple)
    }
}

/// Episode-level termination policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Once this many aircraft have been generated, stop spawning and drain
    pub max_generated_aircraft: u64,
    /// Hard cap on ticks per episode
    pub max_ticks: Option<u64>,
    /// Log progress every this many ticks
    pub progress_interval: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_generated_aircraft: 10_000,
            max_ticks: None,
            progress_interval: 100,
        }
    }
}
