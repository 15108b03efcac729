//! Save-game snapshots.
//!
//! Layout: 4 magic bytes, a little-endian `u16` format version, a
//! little-endian `u32` FNV-1a checksum of the payload, then the bincode
//! encoded [`Simulation`]. Loading checks every layer before any state is
//! replaced, so a damaged snapshot never leaves a half-restored game.

use crate::buildings::BUILDING_COUNT;
use crate::error::{Result, SnapshotError};
use crate::registry::{BULLET_SLOTS, DECORATION_SLOTS, ROBOTS_PER_FACTION};
use crate::simulation::Simulation;

/// Leading bytes of every snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"WBSN";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// Magic, version and checksum.
pub const HEADER_LEN: usize = 10;

const FNV_OFFSET: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over a byte slice.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, &b| (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

/// Encode a simulation into snapshot bytes.
///
/// # Errors
///
/// [`SnapshotError::Encode`] if bincode rejects the state.
pub fn encode(sim: &Simulation) -> Result<Vec<u8>> {
    let payload = bincode::serialize(sim).map_err(|e| SnapshotError::Encode(e.to_string()))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&SNAPSHOT_MAGIC);
    bytes.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&checksum(&payload).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode and validate snapshot bytes.
///
/// # Errors
///
/// Any [`SnapshotError`]: truncated input, wrong magic or version, a
/// checksum mismatch, or a payload that does not describe a whole game.
pub fn decode(bytes: &[u8]) -> Result<Simulation> {
    if bytes.len() < HEADER_LEN {
        return Err(SnapshotError::TooShort.into());
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    if header[..4] != SNAPSHOT_MAGIC {
        return Err(SnapshotError::BadMagic.into());
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version).into());
    }
    let expected = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);
    let actual = checksum(payload);
    if expected != actual {
        return Err(SnapshotError::ChecksumMismatch { expected, actual }.into());
    }

    let sim: Simulation =
        bincode::deserialize(payload).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    check_shape(&sim)?;
    Ok(sim)
}

/// Reject payloads whose pools or grid have the wrong size.
fn check_shape(sim: &Simulation) -> std::result::Result<(), SnapshotError> {
    let problem = if !sim.map.is_complete() {
        Some("map size")
    } else if sim.robots.iter().any(|r| r.capacity() != ROBOTS_PER_FACTION) {
        Some("robot slots")
    } else if sim.bullets.capacity() != BULLET_SLOTS {
        Some("bullet slots")
    } else if sim.decorations.capacity() != DECORATION_SLOTS {
        Some("decoration slots")
    } else if sim.buildings.len() != BUILDING_COUNT {
        Some("building records")
    } else {
        None
    };
    match problem {
        Some(what) => Err(SnapshotError::Decode(format!("unexpected {what}"))),
        None => Ok(()),
    }
}

impl Simulation {
    /// Capture the whole game as snapshot bytes.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Encode`] if encoding fails.
    pub fn save_snapshot(&self) -> Result<Vec<u8>> {
        let bytes = encode(self)?;
        tracing::debug!(tick = self.tick, bytes = bytes.len(), "Snapshot saved");
        Ok(bytes)
    }

    /// Replace the game with a snapshot.
    ///
    /// On error the current state is left untouched.
    ///
    /// # Errors
    ///
    /// Any [`SnapshotError`] from [`decode`].
    pub fn load_snapshot(&mut self, bytes: &[u8]) -> Result<()> {
        let mut restored = match decode(bytes) {
            Ok(sim) => sim,
            Err(error) => {
                tracing::warn!(%error, "Snapshot rejected");
                return Err(error);
            }
        };
        restored.invalidate_radar();
        *self = restored;
        tracing::debug!(tick = self.tick, "Snapshot loaded");
        Ok(())
    }
}
