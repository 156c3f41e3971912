//! Whole-session snapshots.
//!
//! One key per session holds the full [`SimulationState`] plus the time it
//! was written. Saves overwrite; there is no history.
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `architect:session:{key}` | JSON | Latest [`SessionSnapshot`] |

use architect_types::SimulationState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dragonfly::DragonflyPool;
use crate::error::DbError;

/// Stored form of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// When the snapshot was written.
    pub saved_at: DateTime<Utc>,
    /// The simulation as of the last settled tick.
    pub state: SimulationState,
}

/// Saves and restores one named session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    pool: DragonflyPool,
    key: String,
}

/// The `Dragonfly` key for a session.
pub fn session_key(session: &str) -> String {
    format!("architect:session:{session}")
}

impl SessionStore {
    /// A store for `session` over an open connection.
    pub fn new(pool: DragonflyPool, session: &str) -> Self {
        Self {
            pool,
            key: session_key(session),
        }
    }

    /// Overwrite the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if serialization or the write fails.
    pub async fn save(&self, state: &SimulationState, saved_at: DateTime<Utc>) -> Result<(), DbError> {
        let snapshot = SessionSnapshot {
            saved_at,
            state: state.clone(),
        };
        self.pool.set_json(&self.key, &snapshot).await?;
        debug!(
            key = %self.key,
            ticks_settled = state.ticks_settled,
            objects = state.objects.len(),
            "Session saved"
        );
        Ok(())
    }

    /// Load the stored snapshot. `None` when nothing has been saved.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails or the stored value does not
    /// deserialize.
    pub async fn load(&self) -> Result<Option<SessionSnapshot>, DbError> {
        match self.pool.get_json(&self.key).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(DbError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Forget the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn clear(&self) -> Result<(), DbError> {
        self.pool.delete(&self.key).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_session() {
        assert_eq!(session_key("default"), "architect:session:default");
        assert_ne!(session_key("a"), session_key("b"));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = SessionSnapshot {
            saved_at: Utc::now(),
            state: SimulationState::new("Synthesize Sustainable Modular Settlement"),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
