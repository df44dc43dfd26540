//! Error types for the simulation engine.

use thiserror::Error;

use crate::sector::SectorId;

/// Invalid simulation parameters.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("min_speed {min} exceeds max_speed {max}")]
    SpeedRange { min: f64, max: f64 },
    #[error("spawn interval [{lower}, {upper}) is empty or negative")]
    SpawnInterval { lower: f64, upper: f64 },
    #[error("nmac_dist {nmac} must be stricter than minimum_separation {separation}")]
    NmacNotStricter { nmac: f64, separation: f64 },
    #[error("high_priority_probability {0} is outside [0, 1]")]
    Probability(f64),
    #[error("decision_interval must be at least one tick")]
    DecisionInterval,
}

/// Errors raised while constructing the engine.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("noise distribution rejected: {0}")]
    Noise(#[from] rand_distr::NormalError),
}

/// A sector observation whose parallel lists disagree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObservationError {
    #[error(
        "sector {sector}: {ids} ids, {goal_exit_ids} goal exits, {priorities} priorities for {rows} feature rows"
    )]
    LengthMismatch {
        sector: SectorId,
        rows: usize,
        ids: usize,
        goal_exit_ids: usize,
        priorities: usize,
    },
}

/// Failures of the decision cycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error(transparent)]
    Observation(#[from] ObservationError),
}
