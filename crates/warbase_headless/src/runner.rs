//! Single scripted game driven through the core game loop.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use warbase_core::config::EngineConfig;
use warbase_core::factions::Faction;
use warbase_core::game_loop::{Collaborators, GameLoop};
use warbase_core::interfaces::{CountingTicks, InputState, ScriptedInput, SoundEvent};
use warbase_core::simulation::Simulation;

use crate::ascii::{AsciiConfig, AsciiDisplay};
use crate::error::Result;
use crate::store::Store;

/// Game loop as the headless runner wires it.
pub type HeadlessLoop = GameLoop<ScriptedInput, Vec<SoundEvent>, AsciiDisplay, CountingTicks, Store>;

/// Settings for one run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Engine settings.
    pub engine: EngineConfig,
    /// Cycles to run at most.
    pub cycles: u64,
    /// Input per cycle; idle once exhausted.
    pub script: Vec<InputState>,
    /// Snapshot file used by the save key, `--resume` and the final save.
    pub snapshot: Option<PathBuf>,
    /// Load the snapshot before the first cycle.
    pub resume: bool,
    /// Save a snapshot after the last cycle.
    pub save_at_end: bool,
    /// Text display settings.
    pub ascii: AsciiConfig,
}

/// Headline numbers for a game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    /// Simulation tick.
    pub tick: u64,
    /// State hash.
    pub state_hash: u64,
    /// Game clock, `Day d hh:mm`.
    pub clock: String,
    /// Live robots, player then computer.
    pub robots: [usize; 2],
    /// Buildings held, player then computer.
    pub buildings: [u8; 2],
    /// General reserves, player then computer.
    pub reserves: [u8; 2],
    /// Winner, once decided.
    pub winner: Option<Faction>,
}

impl StateSummary {
    /// Summarize a simulation.
    #[must_use]
    pub fn of(sim: &Simulation) -> Self {
        Self {
            tick: sim.tick(),
            state_hash: sim.state_hash(),
            clock: sim.clock().to_string(),
            robots: Faction::ALL.map(|faction| sim.census(faction)),
            buildings: Faction::ALL.map(|faction| sim.holdings(faction).total()),
            reserves: Faction::ALL.map(|faction| sim.resources(faction).general),
            winner: sim.outcome().map(|o| o.winner),
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Seed the game started from.
    pub seed: u64,
    /// Cycles executed.
    pub cycles: u64,
    /// Simulation ticks advanced.
    pub ticks: u64,
    /// External ticks spent in the throttle.
    pub external_ticks: u64,
    /// Sound requests made.
    pub sounds: usize,
    /// Frames presented.
    pub frames: u64,
    /// The run stopped on a failed load.
    pub load_error: bool,
    /// Snapshot written at the end, if any.
    pub snapshot: Option<PathBuf>,
    /// Final state.
    pub state: StateSummary,
}

/// Wire up a loop for `config`.
#[must_use]
pub fn build_loop(config: &RunConfig) -> HeadlessLoop {
    GameLoop::new(
        config.engine.clone(),
        Collaborators {
            input: ScriptedInput::new(config.script.clone()),
            sound: Vec::new(),
            display: AsciiDisplay::new(config.ascii),
            ticks: CountingTicks::default(),
            store: Store::for_path(config.snapshot.as_deref()),
        },
    )
}

/// Run a game and report on it. Returns the loop too, for the last frame.
///
/// # Errors
///
/// A failed resume or final save.
pub fn run_game(config: &RunConfig) -> Result<(RunReport, HeadlessLoop)> {
    let mut game = build_loop(config);
    if config.resume {
        game.load()?;
        tracing::info!(tick = game.simulation().tick(), "Resumed from snapshot");
    }

    let summary = game.run(config.cycles);
    tracing::info!(
        cycles = summary.cycles,
        ticks = summary.ticks,
        outcome = ?summary.outcome,
        "Run finished"
    );

    let mut snapshot = None;
    if config.save_at_end {
        game.save()?;
        snapshot.clone_from(&config.snapshot);
    }

    let io = game.collaborators();
    let report = RunReport {
        seed: config.engine.seed,
        cycles: summary.cycles,
        ticks: summary.ticks,
        external_ticks: summary.external_ticks,
        sounds: io.sound.len(),
        frames: io.display.frames(),
        load_error: game.has_load_error(),
        snapshot,
        state: StateSummary::of(game.simulation()),
    };
    Ok((report, game))
}

/// Write a JSON document, pretty-printed.
///
/// # Errors
///
/// Serialization or IO failures.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| crate::error::HeadlessError::io(parent, e))?;
    }
    std::fs::write(path, json).map_err(|e| crate::error::HeadlessError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use warbase_test_utils::fixtures::open_field_config;

    fn config(cycles: u64) -> RunConfig {
        RunConfig {
            engine: open_field_config(),
            cycles,
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_idle_run_counts_cycles() {
        let (report, game) = run_game(&config(30)).unwrap();
        assert_eq!(report.cycles, 30);
        assert_eq!(report.ticks, 30);
        assert_eq!(report.frames, 30);
        assert_eq!(report.state.tick, 30);
        assert_eq!(report.state.buildings, [1, 1]);
        assert!(!game.collaborators().display.last().is_empty());
    }

    #[test]
    fn test_same_seed_same_report() {
        let mut config = config(200);
        config.engine.enemy_ai_enabled = true;
        let (a, _) = run_game(&config).unwrap();
        let (b, _) = run_game(&config).unwrap();
        assert_eq!(a.state, b.state);
    }

    #[test]
    fn test_save_and_resume() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.wbs");
        let mut first = config(40);
        first.snapshot = Some(path.clone());
        first.save_at_end = true;
        let (saved, _) = run_game(&first).unwrap();
        assert_eq!(saved.snapshot.as_deref(), Some(path.as_path()));

        let resumed = RunConfig {
            resume: true,
            cycles: 0,
            ..first.clone()
        };
        let (report, _) = run_game(&RunConfig { save_at_end: false, ..resumed }).unwrap();
        assert_eq!(report.state.state_hash, saved.state.state_hash);
    }

    #[test]
    fn test_resume_without_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(5);
        config.snapshot = Some(dir.path().join("missing.wbs"));
        config.resume = true;
        assert!(run_game(&config).is_err());
    }
}
