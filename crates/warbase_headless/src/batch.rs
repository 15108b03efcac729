//! Batch runner for determinism and balance checks.
//!
//! Runs many seeded games in parallel using rayon. Each game steps the
//! simulation directly with idle input until it is decided or the tick
//! limit is reached.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use warbase_core::config::EngineConfig;
use warbase_core::factions::Faction;
use warbase_core::interfaces::InputState;
use warbase_core::simulation::Simulation;

use crate::error::{HeadlessError, Result};
use crate::runner::StateSummary;

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Engine settings shared by every game; the seed is replaced per game.
    #[serde(skip)]
    pub engine: EngineConfig,
    /// Number of games to run.
    pub game_count: u32,
    /// Seed of the first game; game `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Tick limit per game.
    pub max_ticks: u64,
    /// Worker threads (0 = rayon default).
    pub parallel_games: u32,
    /// Play every game twice and compare hashes.
    pub check_determinism: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            game_count: 16,
            seed_start: 0,
            max_ticks: 28_800, // 100 game days
            parallel_games: 0,
            check_determinism: false,
        }
    }
}

impl BatchConfig {
    /// Config for `game_count` games.
    #[must_use]
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Self::default()
        }
    }

    /// Set the first seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the tick limit.
    #[must_use]
    pub const fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = ticks;
        self
    }
}

/// One finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Seed used.
    pub seed: u64,
    /// Robots built by the computer.
    pub enemy_built: u32,
    /// Robots destroyed on either side.
    pub robots_destroyed: u32,
    /// Buildings that changed hands.
    pub captures: u32,
    /// Whether a replay matched, when checked.
    pub deterministic: Option<bool>,
    /// Final state.
    pub state: StateSummary,
}

/// Aggregate numbers over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games run.
    pub total_games: u32,
    /// Games won by the player side.
    pub player_wins: u32,
    /// Games won by the computer.
    pub enemy_wins: u32,
    /// Games still open at the tick limit.
    pub undecided: u32,
    /// Mean ticks played.
    pub mean_ticks: f64,
    /// Mean robots built by the computer.
    pub mean_enemy_built: f64,
    /// Seeds whose replay diverged.
    pub diverged: Vec<u64>,
}

impl BatchSummary {
    /// Summarize a list of games.
    #[must_use]
    pub fn from_games(games: &[GameResult]) -> Self {
        let total = games.len().max(1) as f64;
        let wins = |faction| games.iter().filter(|g| g.state.winner == Some(faction)).count() as u32;
        Self {
            total_games: games.len() as u32,
            player_wins: wins(Faction::Player),
            enemy_wins: wins(Faction::Enemy),
            undecided: games.iter().filter(|g| g.state.winner.is_none()).count() as u32,
            mean_ticks: games.iter().map(|g| g.state.tick as f64).sum::<f64>() / total,
            mean_enemy_built: games.iter().map(|g| f64::from(g.enemy_built)).sum::<f64>() / total,
            diverged: games
                .iter()
                .filter(|g| g.deterministic == Some(false))
                .map(|g| g.seed)
                .collect(),
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual games, in seed order.
    pub games: Vec<GameResult>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to a JSON file.
    ///
    /// # Errors
    ///
    /// Serialization or IO failures.
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::runner::write_json(path, self)
    }

    /// Load results from a JSON file.
    ///
    /// # Errors
    ///
    /// IO or parse failures.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| HeadlessError::io(path, e))?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Play one seeded game to the tick limit.
#[must_use]
pub fn play_game(engine: &EngineConfig, seed: u64, max_ticks: u64) -> (GameResult, Simulation) {
    let mut config = engine.clone().with_seed(seed);
    config.battlefield = config.battlefield.with_seed(seed);
    let mut sim = Simulation::new(config);

    let (mut built, mut destroyed, mut captures) = (0u32, 0u32, 0u32);
    while sim.tick() < max_ticks && sim.outcome().is_none() {
        let events = sim.step(&InputState::IDLE);
        built += events
            .robots_built
            .iter()
            .filter(|id| id.faction == Faction::Enemy)
            .count() as u32;
        destroyed += events.robots_destroyed.len() as u32;
        captures += events.captures.len() as u32;
    }

    let result = GameResult {
        seed,
        enemy_built: built,
        robots_destroyed: destroyed,
        captures,
        deterministic: None,
        state: StateSummary::of(&sim),
    };
    (result, sim)
}

/// Run a batch of games.
///
/// # Errors
///
/// Only when a dedicated thread pool cannot be built.
pub fn run_batch(config: BatchConfig) -> Result<BatchResults> {
    let start = Instant::now();
    let completed = AtomicU32::new(0);
    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        max_ticks = config.max_ticks,
        "Starting batch run"
    );

    let play = |i: u32| {
        let seed = config.seed_start.wrapping_add(u64::from(i));
        let (mut result, _) = play_game(&config.engine, seed, config.max_ticks);
        if config.check_determinism {
            let (replay, _) = play_game(&config.engine, seed, config.max_ticks);
            result.deterministic = Some(replay.state == result.state);
        }
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % 10 == 0 {
            debug!("Progress: {}/{}", done, config.game_count);
        }
        result
    };

    let games: Vec<GameResult> = if config.parallel_games > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
            .map_err(|e| HeadlessError::ThreadPool(e.to_string()))?;
        pool.install(|| (0..config.game_count).into_par_iter().map(play).collect())
    } else {
        (0..config.game_count).into_par_iter().map(play).collect()
    };

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        "Batch complete: {} games in {:.1}s, player {} / computer {} / open {}",
        games.len(),
        duration_seconds,
        summary.player_wins,
        summary.enemy_wins,
        summary.undecided
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(50).with_seed(12345).with_max_ticks(10);
        assert_eq!(config.game_count, 50);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.max_ticks, 10);
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(BatchConfig::new(4).with_max_ticks(300)).unwrap();
        assert_eq!(results.games.len(), 4);
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![0, 1, 2, 3]);
        assert_eq!(results.summary.total_games, 4);
        assert!(results.games.iter().all(|g| g.state.tick == 300));
    }

    #[test]
    fn test_determinism_check_passes() {
        let mut config = BatchConfig::new(3).with_seed(9).with_max_ticks(500);
        config.check_determinism = true;
        config.parallel_games = 2;
        let results = run_batch(config).unwrap();
        assert!(results.games.iter().all(|g| g.deterministic == Some(true)));
        assert!(results.summary.diverged.is_empty());
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(BatchConfig::new(2).with_max_ticks(50)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        results.save(&path).unwrap();
        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config.game_count, 2);
    }

    #[test]
    fn test_summary_counts_winners() {
        let (mut game, _) = play_game(&EngineConfig::default(), 1, 1);
        let mut won = game.clone();
        won.state.winner = Some(Faction::Enemy);
        game.deterministic = Some(false);
        let summary = BatchSummary::from_games(&[game, won]);
        assert_eq!(summary.enemy_wins, 1);
        assert_eq!(summary.undecided, 1);
        assert_eq!(summary.diverged, vec![1]);
    }
}
