//! Pause/resume snapshots
//!
//! A snapshot holds everything a round needs to continue exactly where it
//! stopped, including the spawner RNG. Serialized as versioned JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::CollisionTotals;
use super::entities::SpawnState;
use super::entity::Entity;
use super::powerup::EffectState;
use super::state::GameState;

/// Bumped whenever the snapshot layout changes
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
}

/// Captured round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub version: u32,
    pub game: GameState,
    pub effects: EffectState,
    pub entities: Vec<Entity>,
    pub spawn: SpawnState,
    #[serde(default)]
    pub totals: CollisionTotals,
}

impl RoundSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }
}
