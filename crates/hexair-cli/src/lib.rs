//! Experiment driver for the hexagonal sector airspace simulator.
//!
//! Binaries:
//! - run_episodes: runs planner-driven episodes and writes a JSON report

pub mod env;
pub mod report;

pub use env::CliEnv;
pub use report::{load_experiment_config, ExperimentConfig, ExperimentReport, ReportSummary};
