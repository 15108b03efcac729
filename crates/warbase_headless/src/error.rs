//! Errors raised by the headless tools.

use std::path::PathBuf;

use thiserror::Error;
use warbase_core::error::EngineError;

/// Result type alias using [`HeadlessError`].
pub type Result<T> = std::result::Result<T, HeadlessError>;

/// Everything that can stop a headless command.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// The engine refused an operation.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// File access failed.
    #[error("{path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        source: std::io::Error,
    },

    /// JSON output could not be produced or read.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The batch worker pool could not start.
    #[error("Thread pool: {0}")]
    ThreadPool(String),

    /// An input script line could not be parsed.
    #[error("Input script line {line}: {message}")]
    Script {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },
}

impl HeadlessError {
    /// Wrap an IO error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Engine(error) => warbase_core::game_loop::exit_code(error),
            Self::Io { .. } | Self::Script { .. } => 2,
            Self::Json(_) | Self::ThreadPool(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warbase_core::error::SnapshotError;

    #[test]
    fn test_exit_codes() {
        let snapshot = HeadlessError::Engine(EngineError::Snapshot(SnapshotError::BadMagic));
        assert_eq!(snapshot.exit_code(), 3);
        let io = HeadlessError::io("save.wbs", std::io::Error::other("gone"));
        assert_eq!(io.exit_code(), 2);
        assert!(io.to_string().starts_with("save.wbs"));
    }
}
