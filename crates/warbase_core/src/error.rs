//! Error types for the simulation engine.

use thiserror::Error;

use crate::economy::ResourceCategory;
use crate::registry::RobotId;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error type for engine operations.
///
/// None of these are fatal: every operation that returns an error leaves the
/// simulation in a consistent, continuable state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Construction was attempted without enough resources.
    #[error("Insufficient resources: need {required} {category:?}, have {available}")]
    InsufficientResources {
        /// Bucket that could not cover the cost (general when borrowing failed).
        category: Option<ResourceCategory>,
        /// Amount required from that bucket.
        required: u8,
        /// Amount available in that bucket.
        available: u8,
    },

    /// The warbase entrance is occupied.
    #[error("Warbase entrance is blocked")]
    EntranceBlocked,

    /// The requested piece combination cannot form a robot.
    #[error("Invalid piece combination: {0}")]
    InvalidPieces(String),

    /// The player ship is not landed where the action requires.
    #[error("Player ship is not landed on a suitable spot")]
    NotLanded,

    /// The robot reference does not point to a live robot.
    #[error("Invalid robot: {0}")]
    InvalidRobot(RobotId),

    /// The robot belongs to the computer faction.
    #[error("Robot {0} is not controlled by the player")]
    NotPlayerRobot(RobotId),

    /// A fixed-capacity pool is exhausted.
    #[error("No free {0} slot")]
    NoFreeSlot(&'static str),

    /// The robot does not carry the required equipment.
    #[error("Robot {0} lacks the required equipment")]
    MissingEquipment(RobotId),

    /// Snapshot encoding or validation failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO failure while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot integrity and codec errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The buffer is shorter than the snapshot header.
    #[error("Snapshot is truncated")]
    TooShort,

    /// The buffer does not start with the snapshot magic bytes.
    #[error("Not a snapshot (bad magic)")]
    BadMagic,

    /// Produced by an incompatible engine version.
    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u16),

    /// Payload does not match its stored checksum.
    #[error("Snapshot checksum mismatch: stored {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the header.
        expected: u32,
        /// Checksum computed over the payload.
        actual: u32,
    },

    /// Payload passed the checksum but could not be decoded.
    #[error("Failed to decode snapshot: {0}")]
    Decode(String),

    /// State could not be encoded.
    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
}
