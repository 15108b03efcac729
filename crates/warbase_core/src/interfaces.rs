//! Boundaries to the collaborators the engine does not implement itself.
//!
//! Input devices, audio, the display and snapshot storage are all reached
//! through these traits. The core only produces semantic requests; how a
//! beep sounds or where a snapshot lands is the caller's business.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::framebuffer::Framebuffer;
use crate::radar::RadarView;

/// Controls sampled once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InputState {
    /// Towards higher rows.
    pub up: bool,
    /// Towards lower rows.
    pub down: bool,
    /// Towards lower columns.
    pub left: bool,
    /// Towards higher columns.
    pub right: bool,
    /// Fire (direct control).
    pub fire: bool,
    /// Toggle pause.
    pub pause: bool,
    /// Save a snapshot.
    pub save: bool,
    /// Abandon the game.
    pub restart: bool,
}

impl InputState {
    /// No controls pressed.
    pub const IDLE: Self = Self {
        up: false,
        down: false,
        left: false,
        right: false,
        fire: false,
        pause: false,
        save: false,
        restart: false,
    };

    /// First pressed direction, checked right, left, down, up.
    #[must_use]
    pub const fn direction(&self) -> Option<crate::direction::Direction> {
        use crate::direction::Direction;
        if self.right {
            Some(Direction::Right)
        } else if self.left {
            Some(Direction::Left)
        } else if self.down {
            Some(Direction::Down)
        } else if self.up {
            Some(Direction::Up)
        } else {
            None
        }
    }

    /// Pack into a bitset (right, left, down, up, fire, pause, save, restart).
    #[must_use]
    pub const fn bits(&self) -> u8 {
        (self.right as u8)
            | (self.left as u8) << 1
            | (self.down as u8) << 2
            | (self.up as u8) << 3
            | (self.fire as u8) << 4
            | (self.pause as u8) << 5
            | (self.save as u8) << 6
            | (self.restart as u8) << 7
    }

    /// Inverse of [`Self::bits`].
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            right: bits & 1 != 0,
            left: bits & 1 << 1 != 0,
            down: bits & 1 << 2 != 0,
            up: bits & 1 << 3 != 0,
            fire: bits & 1 << 4 != 0,
            pause: bits & 1 << 5 != 0,
            save: bits & 1 << 6 != 0,
            restart: bits & 1 << 7 != 0,
        }
    }
}

/// Semantic sound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEvent {
    /// A bullet left a barrel.
    WeaponFired,
    /// A robot was destroyed.
    RobotDestroyed,
    /// Menu cursor moved.
    MenuMove,
    /// A request was refused.
    ErrorBeep,
    /// A nuclear warhead went off.
    NuclearExplosion,
}

/// Supplies controls.
pub trait InputSource {
    /// Sample the controls.
    fn poll_input(&mut self) -> InputState;
}

/// Plays sounds. Fire-and-forget.
pub trait SoundSink {
    /// Queue a sound.
    fn request_sound(&mut self, event: SoundEvent);
}

/// Receives finished frames.
pub trait DisplaySink {
    /// Show a frame and the radar.
    fn present(&mut self, frame: &Framebuffer, radar: &RadarView);
}

/// External fixed-rate clock.
pub trait TickSource {
    /// Monotonic tick count.
    fn now(&mut self) -> u64;
}

/// Persists snapshot bytes.
pub trait SnapshotStore {
    /// Store a snapshot.
    fn save(&mut self, bytes: &[u8]) -> Result<()>;

    /// Fetch the last stored snapshot.
    fn load(&mut self) -> Result<Vec<u8>>;
}

/// Input source that never presses anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleInput;

impl InputSource for IdleInput {
    fn poll_input(&mut self) -> InputState {
        InputState::IDLE
    }
}

/// Input source replaying a fixed sequence, then idling.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: Vec<InputState>,
    cursor: usize,
}

impl ScriptedInput {
    /// Replay `frames` in order.
    #[must_use]
    pub fn new(frames: Vec<InputState>) -> Self {
        Self { frames, cursor: 0 }
    }
}

impl InputSource for ScriptedInput {
    fn poll_input(&mut self) -> InputState {
        let state = self.frames.get(self.cursor).copied().unwrap_or_default();
        self.cursor += 1;
        state
    }
}

/// Records sounds instead of playing them.
impl SoundSink for Vec<SoundEvent> {
    fn request_sound(&mut self, event: SoundEvent) {
        self.push(event);
    }
}

/// Discards frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn present(&mut self, _frame: &Framebuffer, _radar: &RadarView) {}
}

/// Tick source that advances by one on every read.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountingTicks {
    now: u64,
}

impl TickSource for CountingTicks {
    fn now(&mut self) -> u64 {
        self.now += 1;
        self.now
    }
}

/// Snapshot store kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
}

impl MemoryStore {
    /// Store pre-filled with bytes.
    #[must_use]
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&mut self, bytes: &[u8]) -> Result<()> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }

    fn load(&mut self) -> Result<Vec<u8>> {
        self.bytes
            .clone()
            .ok_or(crate::error::EngineError::Snapshot(crate::error::SnapshotError::TooShort))
    }
}

/// Enforces a minimum number of external ticks per simulated cycle.
///
/// Waiting spins on the tick source instead of sleeping, so a cycle never
/// starts early and never loses an external tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throttle {
    min_ticks: u32,
    last: Option<u64>,
}

impl Throttle {
    /// Throttle with the given floor.
    #[must_use]
    pub const fn new(min_ticks: u32) -> Self {
        Self {
            min_ticks,
            last: None,
        }
    }

    /// Block until `min_ticks` have passed since the previous call.
    /// Returns the external ticks that elapsed.
    pub fn wait(&mut self, source: &mut impl TickSource) -> u64 {
        let mut now = source.now();
        let elapsed = match self.last {
            None => 0,
            Some(last) => {
                while now.saturating_sub(last) < u64::from(self.min_ticks) {
                    now = source.now();
                }
                now - last
            }
        };
        self.last = Some(now);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    #[test]
    fn test_input_bits_round_trip() {
        let input = InputState {
            left: true,
            fire: true,
            restart: true,
            ..InputState::IDLE
        };
        assert_eq!(InputState::from_bits(input.bits()), input);
        assert_eq!(InputState::IDLE.bits(), 0);
    }

    #[test]
    fn test_direction_priority() {
        let input = InputState {
            up: true,
            left: true,
            ..InputState::IDLE
        };
        assert_eq!(input.direction(), Some(Direction::Left));
        assert_eq!(InputState::IDLE.direction(), None);
    }

    #[test]
    fn test_throttle_enforces_floor() {
        let mut ticks = CountingTicks::default();
        let mut throttle = Throttle::new(10);
        assert_eq!(throttle.wait(&mut ticks), 0);
        assert_eq!(throttle.wait(&mut ticks), 10);
        assert_eq!(throttle.wait(&mut ticks), 10);
    }

    #[test]
    fn test_scripted_input_then_idle() {
        let press = InputState {
            fire: true,
            ..InputState::IDLE
        };
        let mut input = ScriptedInput::new(vec![press]);
        assert_eq!(input.poll_input(), press);
        assert_eq!(input.poll_input(), InputState::IDLE);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        assert!(store.load().is_err());
        store.save(&[1, 2, 3]).unwrap();
        assert_eq!(store.load().unwrap(), vec![1, 2, 3]);
    }
}
