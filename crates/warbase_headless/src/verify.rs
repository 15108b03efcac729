//! Snapshot file inspection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use warbase_core::snapshot::{checksum, decode, HEADER_LEN};

use crate::error::{HeadlessError, Result};
use crate::runner::StateSummary;

/// What a valid snapshot file holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReport {
    /// File checked.
    pub path: PathBuf,
    /// File size.
    pub bytes: usize,
    /// Payload checksum.
    pub checksum: u32,
    /// Decoded state.
    pub state: StateSummary,
}

/// Load and validate a snapshot file.
///
/// # Errors
///
/// IO failures or any snapshot integrity error.
pub fn verify_snapshot(path: &Path) -> Result<SnapshotReport> {
    let bytes = std::fs::read(path).map_err(|e| HeadlessError::io(path, e))?;
    let sim = decode(&bytes)?;
    let report = SnapshotReport {
        path: path.to_path_buf(),
        bytes: bytes.len(),
        checksum: checksum(&bytes[HEADER_LEN..]),
        state: StateSummary::of(&sim),
    };
    tracing::info!(path = %path.display(), tick = report.state.tick, "Snapshot valid");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warbase_core::error::{EngineError, SnapshotError};
    use warbase_core::interfaces::InputState;
    use warbase_test_utils::fixtures::open_field;

    #[test]
    fn test_valid_snapshot_reports_state() {
        let mut sim = open_field();
        for _ in 0..12 {
            sim.step(&InputState::IDLE);
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.wbs");
        std::fs::write(&path, sim.save_snapshot().unwrap()).unwrap();

        let report = verify_snapshot(&path).unwrap();
        assert_eq!(report.state.tick, 12);
        assert_eq!(report.state.state_hash, sim.state_hash());
        assert_eq!(report.state.clock, "Day 1 01:00");
    }

    #[test]
    fn test_damaged_snapshot_rejected() {
        let sim = open_field();
        let mut bytes = sim.save_snapshot().unwrap();
        bytes[HEADER_LEN + 3] ^= 0x55;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.wbs");
        std::fs::write(&path, bytes).unwrap();

        let err = verify_snapshot(&path).unwrap_err();
        assert!(matches!(
            err,
            HeadlessError::Engine(EngineError::Snapshot(SnapshotError::ChecksumMismatch { .. }))
        ));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_missing_file_is_io() {
        let err = verify_snapshot(Path::new("/nonexistent/game.wbs")).unwrap_err();
        assert!(matches!(err, HeadlessError::Io { .. }));
    }
}
