//! Snapshot (de)serialization at the persistence boundary.
//!
//! The core exposes a single serializable [`GameState`] value; reading and
//! writing it to device or remote storage is an external adapter's job. The
//! only guarantee made here is that re-hydrating a snapshot and applying
//! changes onward behaves identically to a session that was never
//! serialized.

use thiserror::Error;

use crate::state::{GameState, SAVE_VERSION};

/// Errors from snapshot encoding and decoding.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

impl GameState {
    /// Encode the snapshot as JSON for the storage adapter.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a snapshot, rejecting saves from a different format version.
    pub fn from_json(raw: &str) -> Result<GameState, SnapshotError> {
        let state: GameState = serde_json::from_str(raw)?;
        if state.version != SAVE_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SAVE_VERSION,
                found: state.version,
            });
        }
        Ok(state)
    }
}
