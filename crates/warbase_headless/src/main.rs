//! Headless warbase runner.
//!
//! Runs the game without a screen. Reports go to stdout as JSON; logs go to
//! stderr.
//!
//! # Usage
//!
//! ```bash
//! # Play a scripted game and print the report
//! cargo run -p warbase_headless -- run --cycles 2000 --script moves.txt
//!
//! # Batch of seeded games with a determinism check
//! cargo run -p warbase_headless -- batch --count 100 --check-determinism --output results.json
//!
//! # Save a snapshot after N cycles and validate it
//! cargo run -p warbase_headless -- snapshot --cycles 1000 --output game.wbs
//! cargo run -p warbase_headless -- verify game.wbs
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use warbase_core::config::EngineConfig;
use warbase_core::render::VIEW_COLUMNS;
use warbase_headless::{
    ascii::render_map,
    batch::{run_batch, BatchConfig},
    error::Result,
    runner::{run_game, write_json, RunConfig},
    script::load_script,
    verify::verify_snapshot,
};

#[derive(Parser)]
#[command(name = "warbase")]
#[command(about = "Headless warbase runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration file (RON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game through the game loop
    Run {
        /// Cycles to run
        #[arg(long, default_value = "1000")]
        cycles: u64,

        /// Input script, one line per cycle
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Snapshot file for the save key and --resume
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Load the snapshot before playing
        #[arg(long, requires = "snapshot")]
        resume: bool,

        /// Print the last frame as text
        #[arg(long)]
        frame: bool,

        /// Print a map strip around the ship
        #[arg(long)]
        map: bool,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run many seeded games in parallel
    Batch {
        /// Number of games
        #[arg(short = 'n', long, default_value = "16")]
        count: u32,

        /// Tick limit per game
        #[arg(long, default_value = "28800")]
        max_ticks: u64,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Play every game twice and compare
        #[arg(long)]
        check_determinism: bool,

        /// Write JSON results here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play N cycles, then save a snapshot
    Snapshot {
        /// Cycles to run before saving
        #[arg(long, default_value = "1000")]
        cycles: u64,

        /// Input script, one line per cycle
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Load and validate a snapshot file
    Verify {
        /// Snapshot file
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs to stderr; stdout carries the JSON reports.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .init();

    if let Err(error) = dispatch(cli) {
        tracing::error!(%error, "Command failed");
        std::process::exit(error.exit_code());
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let engine = engine_config(cli.config.as_deref(), cli.seed)?;
    match cli.command {
        Commands::Run {
            cycles,
            script,
            snapshot,
            resume,
            frame,
            map,
            output,
        } => cmd_run(engine, cycles, script, snapshot, resume, frame, map, output),
        Commands::Batch {
            count,
            max_ticks,
            parallel,
            check_determinism,
            output,
        } => {
            let config = BatchConfig {
                engine,
                game_count: count,
                seed_start: cli.seed.unwrap_or(0),
                max_ticks,
                parallel_games: parallel,
                check_determinism,
            };
            let results = run_batch(config)?;
            if !results.summary.diverged.is_empty() {
                tracing::error!(seeds = ?results.summary.diverged, "Non-determinism detected");
            }
            emit(output.as_deref(), &results)
        }
        Commands::Snapshot {
            cycles,
            script,
            output,
        } => {
            let config = RunConfig {
                engine,
                cycles,
                script: script.as_deref().map(load_script).transpose()?.unwrap_or_default(),
                snapshot: Some(output),
                save_at_end: true,
                ..RunConfig::default()
            };
            let (report, _) = run_game(&config)?;
            emit(None, &report)
        }
        Commands::Verify { path } => {
            let report = verify_snapshot(&path)?;
            emit(None, &report)
        }
    }
}

fn engine_config(path: Option<&Path>, seed: Option<u64>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
        config.battlefield = config.battlefield.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    engine: EngineConfig,
    cycles: u64,
    script: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    resume: bool,
    frame: bool,
    map: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let script = match script {
        Some(path) => load_script(&path)?,
        None => Vec::new(),
    };
    tracing::info!(seed = engine.seed, cycles, script_cycles = script.len(), "Starting run");

    let config = RunConfig {
        engine,
        cycles,
        script,
        snapshot,
        resume,
        ..RunConfig::default()
    };
    let (report, game) = run_game(&config)?;

    if frame {
        eprintln!("{}", game.collaborators().display.last());
    }
    if map {
        let sim = game.simulation();
        let scroll = sim.viewport_scroll();
        eprintln!("{}", render_map(sim, scroll, VIEW_COLUMNS * 4));
    }
    emit(output.as_deref(), &report)
}

/// Print JSON to stdout, or write it to a file.
fn emit<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    match output {
        Some(path) => {
            write_json(path, value)?;
            tracing::info!(path = %path.display(), "Results written");
            Ok(())
        }
        None => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
    }
}
