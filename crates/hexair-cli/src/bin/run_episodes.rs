//! Run planner-driven episodes on the hexagonal sector airspace.
//!
//! Each episode resets the airspace, lets the two-tier decision cycle steer
//! traffic until the spawn limit is reached, then drains. Per-episode
//! statistics are written to a JSON report.
//!
//! Usage:
//!   cargo run -p hexair-cli --bin run_episodes -- -e 3 --seed 7 -p output/seed7.json

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use hexair_cli::{load_experiment_config, CliEnv, ExperimentConfig, ExperimentReport};
use hexair_core::{Airspace, EpisodeRunner, LookaheadPlanner};

const DEFAULT_EPISODES: u32 = 10;
const DEFAULT_SEED: u64 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run airspace episodes with the built-in lookahead planner")]
struct Args {
    /// Number of episodes [env: HEXAIR_EPISODES, default: 10]
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Seed for the engine RNG [env: HEXAIR_SEED, default: 2]
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the JSON report
    #[arg(short = 'p', long, default_value = "output/seed2.json")]
    save_path: PathBuf,

    /// JSON experiment config (sim, decision and episode sections)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop spawning after this many aircraft
    #[arg(long)]
    max_generated: Option<u64>,

    /// Hard cap on ticks per episode
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Debug-level logging
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug, args.log_json)?;

    let env = CliEnv::from_env();
    let episodes = args.episodes.or(env.episodes).unwrap_or(DEFAULT_EPISODES);
    let seed = args.seed.or(env.seed).unwrap_or(DEFAULT_SEED);

    let mut config = match &args.config {
        Some(path) => load_experiment_config(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(limit) = args.max_generated {
        config.episode.max_generated_aircraft = limit;
    }
    if args.max_ticks.is_some() {
        config.episode.max_ticks = args.max_ticks;
    }

    tracing::info!(episodes, seed, path = %args.save_path.display(), "starting run");

    let mut airspace = Airspace::new(config.sim.clone(), seed)?;
    let mut planner = LookaheadPlanner::from_config(&config.sim);
    let mut runner = EpisodeRunner::new(
        config.decision.clone(),
        config.episode.clone(),
        config.sim.minimum_separation,
    )?;

    let mut results = Vec::with_capacity(episodes as usize);
    for episode in 0..episodes {
        tracing::info!(episode, "episode started");
        let stats = runner.run_episode(&mut airspace, &mut planner)?;
        tracing::info!(
            episode,
            ticks = stats.ticks,
            conflicts = stats.conflicts,
            nmacs = stats.nmac_events,
            nmac_per_hour = stats.nmac_per_hour,
            "episode done"
        );
        results.push(stats);
    }

    let report = ExperimentReport::new(seed, config, results);
    report.write_to(&args.save_path)?;
    tracing::info!(
        conflicts = report.summary.conflicts,
        nmacs = report.summary.nmac_events,
        nmac_per_hour = report.summary.nmac_per_hour,
        path = %args.save_path.display(),
        "report written"
    );

    Ok(())
}

fn init_tracing(debug: bool, json: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("hexair_core={level}").parse()?)
        .add_directive(format!("run_episodes={level}").parse()?);

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();
    Ok(())
}
