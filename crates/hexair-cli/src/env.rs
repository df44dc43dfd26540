//! Fallback settings from environment.

use std::env;

/// Values used when the matching command-line flag is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliEnv {
    pub seed: Option<u64>,
    pub episodes: Option<u32>,
}

impl CliEnv {
    pub fn from_env() -> Self {
        Self {
            seed: env::var("HEXAIR_SEED").ok().and_then(|s| s.parse().ok()),
            episodes: env::var("HEXAIR_EPISODES").ok().and_then(|s| s.parse().ok()),
        }
    }
}
