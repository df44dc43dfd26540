//! Experiment configuration files and JSON result reports.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hexair_core::{nmac_rate, DecisionConfig, EpisodeConfig, EpisodeStats, SimConfig};

/// Everything an experiment can be configured with; every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub sim: SimConfig,
    pub decision: DecisionConfig,
    pub episode: EpisodeConfig,
}

/// Read an experiment configuration from a JSON file.
pub fn load_experiment_config(path: &Path) -> Result<ExperimentConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: ExperimentConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

/// Totals across all episodes of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub episodes: usize,
    pub conflicts: u64,
    pub nmac_events: u64,
    pub goals: u64,
    pub generated_aircraft: u64,
    pub total_timesteps: u64,
    pub nmac_per_hour: f64,
}

impl ReportSummary {
    pub fn from_episodes(episodes: &[EpisodeStats]) -> Self {
        let nmac_events = episodes.iter().map(|e| e.nmac_events).sum();
        let total_timesteps = episodes.iter().map(|e| e.total_timesteps).sum();
        Self {
            episodes: episodes.len(),
            conflicts: episodes.iter().map(|e| e.conflicts).sum(),
            nmac_events,
            goals: episodes.iter().map(|e| e.goals).sum(),
            generated_aircraft: episodes.iter().map(|e| e.generated_aircraft).sum(),
            total_timesteps,
            nmac_per_hour: nmac_rate(nmac_events, total_timesteps),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub config: ExperimentConfig,
    pub summary: ReportSummary,
    pub episodes: Vec<EpisodeStats>,
}

impl ExperimentReport {
    pub fn new(seed: u64, config: ExperimentConfig, episodes: Vec<EpisodeStats>) -> Self {
        Self {
            generated_at: Utc::now(),
            seed,
            config,
            summary: ReportSummary::from_episodes(&episodes),
            episodes,
        }
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
        Ok(())
    }
}
