//! Cycle driver binding the simulation to its collaborators.
//!
//! One cycle waits out the throttle, samples input, handles the pause, save
//! and restart keys, steps the simulation, forwards sounds and presents a
//! frame. A failed snapshot load parks the loop until a restart.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::interfaces::{
    DisplaySink, InputSource, InputState, SnapshotStore, SoundEvent, SoundSink, Throttle,
    TickSource,
};
use crate::render::Renderer;
use crate::simulation::{Outcome, Simulation, TickEvents};

/// What a cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    /// The simulation advanced one tick.
    Stepped(TickEvents),
    /// Paused; the last frame was shown again.
    Paused,
    /// Waiting for a restart after a failed load.
    LoadError,
    /// A fresh game was started.
    Restarted,
    /// The game is over.
    GameOver(Outcome),
}

/// Totals from [`GameLoop::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles executed.
    pub cycles: u64,
    /// Simulation ticks advanced.
    pub ticks: u64,
    /// External ticks spent waiting in the throttle.
    pub external_ticks: u64,
    /// Final outcome, if the game ended.
    pub outcome: Option<Outcome>,
}

/// The collaborators a loop talks to.
#[derive(Debug, Clone, Default)]
pub struct Collaborators<I, S, D, T, P> {
    /// Controls.
    pub input: I,
    /// Audio.
    pub sound: S,
    /// Screen.
    pub display: D,
    /// External clock.
    pub ticks: T,
    /// Snapshot storage.
    pub store: P,
}

/// Runs the game against a set of collaborators.
#[derive(Debug)]
pub struct GameLoop<I, S, D, T, P> {
    config: EngineConfig,
    sim: Simulation,
    renderer: Renderer,
    throttle: Throttle,
    io: Collaborators<I, S, D, T, P>,
    paused: bool,
    load_failed: bool,
    previous: InputState,
}

impl<I, S, D, T, P> GameLoop<I, S, D, T, P>
where
    I: InputSource,
    S: SoundSink,
    D: DisplaySink,
    T: TickSource,
    P: SnapshotStore,
{
    /// Start a new game.
    pub fn new(config: EngineConfig, io: Collaborators<I, S, D, T, P>) -> Self {
        let sim = Simulation::new(config.clone());
        Self::with_simulation(config, sim, io)
    }

    /// Drive an existing simulation.
    pub fn with_simulation(config: EngineConfig, sim: Simulation, io: Collaborators<I, S, D, T, P>) -> Self {
        Self {
            throttle: Throttle::new(config.min_ticks_per_cycle),
            config,
            sim,
            renderer: Renderer::new(),
            io,
            paused: false,
            load_failed: false,
            previous: InputState::IDLE,
        }
    }

    /// The simulation being driven.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Mutable access for menu commands between cycles.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    /// The renderer and its last frame.
    #[must_use]
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The collaborators.
    #[must_use]
    pub const fn collaborators(&self) -> &Collaborators<I, S, D, T, P> {
        &self.io
    }

    /// Whether the pause key has stopped the game.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether a failed load is waiting for a restart.
    #[must_use]
    pub const fn has_load_error(&self) -> bool {
        self.load_failed
    }

    /// Run one cycle.
    pub fn cycle(&mut self) -> Cycle {
        self.throttle.wait(&mut self.io.ticks);
        let input = self.io.input.poll_input();
        let previous = std::mem::replace(&mut self.previous, input);
        let pressed = |now: bool, before: bool| now && !before;

        if pressed(input.restart, previous.restart) {
            self.restart();
            return Cycle::Restarted;
        }
        if self.load_failed {
            return Cycle::LoadError;
        }
        if let Some(outcome) = self.sim.outcome() {
            return Cycle::GameOver(outcome);
        }
        if pressed(input.pause, previous.pause) {
            self.paused = !self.paused;
            tracing::info!(paused = self.paused, "Pause toggled");
        }
        if pressed(input.save, previous.save) {
            if let Err(error) = self.save() {
                tracing::warn!(%error, "Save failed");
            }
        }
        if self.paused {
            self.present();
            return Cycle::Paused;
        }

        let events = self.sim.step(&input);
        for sound in &events.sounds {
            self.io.sound.request_sound(*sound);
        }
        self.renderer.render(&self.sim);
        self.present();

        match events.outcome {
            Some(outcome) => Cycle::GameOver(outcome),
            None => Cycle::Stepped(events),
        }
    }

    /// Run until the game ends or `max_cycles` have passed.
    pub fn run(&mut self, max_cycles: u64) -> RunSummary {
        let mut summary = RunSummary::default();
        let start_tick = self.sim.tick();
        while summary.cycles < max_cycles {
            let before = self.io.ticks.now();
            let cycle = self.cycle();
            summary.external_ticks += self.io.ticks.now().saturating_sub(before);
            summary.cycles += 1;
            if let Cycle::GameOver(outcome) = cycle {
                summary.outcome = Some(outcome);
                break;
            }
            if cycle == Cycle::LoadError {
                break;
            }
        }
        summary.ticks = self.sim.tick().saturating_sub(start_tick);
        summary
    }

    /// Write a snapshot to the store.
    ///
    /// # Errors
    ///
    /// Encoding or storage failures; the game continues either way.
    pub fn save(&mut self) -> Result<()> {
        let result = self
            .sim
            .save_snapshot()
            .and_then(|bytes| self.io.store.save(&bytes));
        if result.is_err() {
            self.io.sound.request_sound(SoundEvent::ErrorBeep);
        }
        result
    }

    /// Replace the game with the stored snapshot.
    ///
    /// A damaged or missing snapshot leaves the current state untouched and
    /// parks the loop until [`Self::restart`].
    ///
    /// # Errors
    ///
    /// The storage or snapshot error.
    pub fn load(&mut self) -> Result<()> {
        let result = self
            .io
            .store
            .load()
            .and_then(|bytes| self.sim.load_snapshot(&bytes));
        if let Err(ref error) = result {
            self.load_failed = true;
            self.io.sound.request_sound(SoundEvent::ErrorBeep);
            tracing::error!(%error, "Load failed, restart required");
        } else {
            self.paused = false;
        }
        result
    }

    /// Throw the game away and start over.
    pub fn restart(&mut self) {
        self.sim = Simulation::new(self.config.clone());
        self.paused = false;
        self.load_failed = false;
        tracing::info!(seed = self.config.seed, "Game restarted");
    }

    fn present(&mut self) {
        self.io
            .display
            .present(self.renderer.frame(), self.renderer.radar_view());
    }
}

/// Map a loop error to a process exit code.
#[must_use]
pub const fn exit_code(error: &EngineError) -> i32 {
    match error {
        EngineError::Snapshot(_) => 3,
        EngineError::Config(_) | EngineError::Io(_) => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{CountingTicks, MemoryStore, NullDisplay, ScriptedInput};
    use crate::map_generation::BattlefieldConfig;

    type TestLoop = GameLoop<ScriptedInput, Vec<SoundEvent>, NullDisplay, CountingTicks, MemoryStore>;

    fn config() -> EngineConfig {
        EngineConfig {
            battlefield: BattlefieldConfig {
                terrain_patches: 0,
                ..BattlefieldConfig::default()
            },
            ..EngineConfig::default()
        }
    }

    fn game(frames: Vec<InputState>) -> TestLoop {
        GameLoop::new(
            config(),
            Collaborators {
                input: ScriptedInput::new(frames),
                ..Collaborators::default()
            },
        )
    }

    fn key(f: impl FnOnce(&mut InputState)) -> InputState {
        let mut input = InputState::IDLE;
        f(&mut input);
        input
    }

    #[test]
    fn test_throttle_spends_min_ticks_per_cycle() {
        let mut game = game(Vec::new());
        let summary = game.run(5);
        assert_eq!(summary.cycles, 5);
        assert_eq!(summary.ticks, 5);
        // The first cycle does not wait.
        assert!(summary.external_ticks >= 4 * 10);
    }

    #[test]
    fn test_pause_toggles_on_press() {
        let pause = key(|i| i.pause = true);
        let mut game = game(vec![pause, pause, InputState::IDLE, pause]);
        assert_eq!(game.cycle(), Cycle::Paused);
        // Held key does not toggle again.
        assert_eq!(game.cycle(), Cycle::Paused);
        assert_eq!(game.cycle(), Cycle::Paused);
        assert!(matches!(game.cycle(), Cycle::Stepped(_)));
        assert_eq!(game.simulation().tick(), 1);
    }

    #[test]
    fn test_save_key_stores_snapshot() {
        let mut game = game(vec![key(|i| i.save = true)]);
        game.cycle();
        let mut store = game.collaborators().store.clone();
        let bytes = store.load().unwrap();
        assert_eq!(&bytes[..4], b"WBSN");
    }

    #[test]
    fn test_load_error_parks_until_restart() {
        let mut game = game(vec![
            InputState::IDLE,
            InputState::IDLE,
            key(|i| i.restart = true),
            InputState::IDLE,
        ]);
        game.cycle();
        let hash = game.simulation().state_hash();
        assert!(game.load().is_err());
        assert!(game.has_load_error());
        assert_eq!(game.simulation().state_hash(), hash);
        assert!(game.collaborators().sound.contains(&SoundEvent::ErrorBeep));
        assert_eq!(game.cycle(), Cycle::LoadError);
        assert_eq!(game.cycle(), Cycle::Restarted);
        assert_eq!(game.simulation().tick(), 0);
        assert!(matches!(game.cycle(), Cycle::Stepped(_)));
    }

    #[test]
    fn test_load_restores_saved_game() {
        let mut game = game(Vec::new());
        game.run(20);
        game.save().unwrap();
        let saved = game.simulation().state_hash();
        game.run(20);
        game.load().unwrap();
        assert_eq!(game.simulation().state_hash(), saved);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&EngineError::Config("x".into())), 2);
        assert_eq!(exit_code(&EngineError::EntranceBlocked), 1);
    }
}
