//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and snapshots rely on the step being a pure function of the
//! state and the input. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: the core iterates slot arrays by index.
//! - **System randomness**: every draw comes from the state's own source.
//! - **Thread scheduling**: the core never spawns threads; running many
//!   simulations side by side must still agree.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use serde::{Deserialize, Serialize};

use warbase_core::interfaces::InputState;
use warbase_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Example
///
/// ```
/// use warbase_core::interfaces::InputState;
/// use warbase_test_utils::determinism::verify_determinism;
/// use warbase_test_utils::fixtures::open_field;
///
/// let result = verify_determinism(
///     3,
///     50,
///     open_field,
///     |sim| {
///         sim.step(&InputState::IDLE);
///     },
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Input for a tick of a scripted run: a repeating pattern keyed on the tick.
#[must_use]
pub fn scripted_input(tick: u64, script: &[InputState]) -> InputState {
    if script.is_empty() {
        return InputState::IDLE;
    }
    script[(tick % script.len() as u64) as usize]
}

/// Step a simulation `ticks` times feeding a repeating input script.
pub fn run_script(sim: &mut Simulation, ticks: u64, script: &[InputState]) {
    for _ in 0..ticks {
        let input = scripted_input(sim.tick(), script);
        sim.step(&input);
    }
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N simulations on scoped threads and collect their final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.step(&InputState::IDLE);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two runs tick by tick, returning the first tick they differ on.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.step(&InputState::IDLE);
        sim2.step(&InputState::IDLE);
        if sim1.state_hash() != sim2.state_hash() {
            tracing::warn!(tick, "Simulations diverged");
            return Some(tick);
        }
    }

    None
}

/// Verify that a snapshot round trip preserves the state exactly.
pub fn verify_snapshot_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    for _ in 0..num_ticks {
        sim.step(&InputState::IDLE);
    }
    let hash_before = sim.state_hash();

    let Ok(bytes) = sim.save_snapshot() else {
        return false;
    };
    let Ok(restored) = warbase_core::snapshot::decode(&bytes) else {
        return false;
    };

    restored.state_hash() == hash_before
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation testing.
pub mod strategies {
    use proptest::prelude::*;
    use warbase_core::interfaces::InputState;
    use warbase_core::map::{MAP_HEIGHT, MAP_WIDTH};
    use warbase_core::pieces::{Piece, PieceSet};

    /// Any map cell, fences included.
    pub fn arb_cell() -> impl Strategy<Value = (i16, i16)> {
        (0..MAP_WIDTH, 0..MAP_HEIGHT)
    }

    /// Controls without the pause, save and restart keys.
    pub fn arb_input() -> impl Strategy<Value = InputState> {
        (0u8..32).prop_map(InputState::from_bits)
    }

    /// A sequence of inputs.
    pub fn arb_input_script(max_len: usize) -> impl Strategy<Value = Vec<InputState>> {
        prop::collection::vec(arb_input(), 1..max_len)
    }

    /// A chassis plus at least one other piece.
    pub fn arb_buildable_pieces() -> impl Strategy<Value = PieceSet> {
        (0usize..3, 1u8..32).prop_map(|(chassis, rest)| {
            let chassis = [Piece::Bipod, Piece::Tracks, Piece::Antigrav][chassis];
            PieceSet::from_bits(chassis.bit() | (rest << 3))
        })
    }

    /// Simulation seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::open_field;

    #[test]
    fn test_verify_determinism_identical_runs() {
        let result = verify_determinism(3, 100, || 42u64, |s| *s = s.wrapping_mul(31), |s| *s);
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_verify_determinism_catches_divergence() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |s| *s,
        );
        assert!(!result.is_deterministic);
    }

    #[test]
    fn test_full_game_is_deterministic() {
        let setup = || Simulation::new(warbase_core::config::EngineConfig::default());
        let result = verify_determinism(2, 300, setup, |sim| {
            sim.step(&InputState::IDLE);
        }, Simulation::state_hash);
        result.assert_deterministic();
        assert_eq!(find_first_divergence(setup, 100), None);
    }

    #[test]
    fn test_parallel_simulations_agree() {
        run_parallel_simulations(open_field, 4, 100).assert_deterministic();
    }

    #[test]
    fn test_snapshot_round_trip() {
        assert!(verify_snapshot_determinism(open_field, 50));
    }

    #[test]
    fn test_scripted_input_repeats() {
        let mut right = InputState::IDLE;
        right.right = true;
        let script = [InputState::IDLE, right];
        assert_eq!(scripted_input(0, &script), InputState::IDLE);
        assert_eq!(scripted_input(3, &script), right);
        assert_eq!(scripted_input(7, &[]), InputState::IDLE);
    }
}
