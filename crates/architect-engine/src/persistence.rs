//! Session snapshots after every settled tick.
//!
//! The tick loop hands each settled state to a single writer task through
//! a `watch` channel. Writes happen one at a time, in tick order; if the
//! store falls behind, intermediate snapshots are skipped and only the
//! newest is written. Dropping the persister lets the writer flush the
//! last snapshot and exit.

use std::future::Future;
use std::sync::Arc;

use architect_core::{TickCallback, TickOutcome, TimeSource};
use architect_db::{DbError, SessionSnapshot, SessionStore};
use architect_types::SimulationState;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Forwards settled states to the session writer task.
pub struct SessionPersister {
    tx: watch::Sender<Option<SessionSnapshot>>,
    clock: Arc<dyn TimeSource>,
}

impl SessionPersister {
    /// Persist through `store`, stamping snapshots with `clock`.
    ///
    /// Returns the callback and the writer task, which finishes once the
    /// callback is dropped and the last snapshot is written.
    pub fn spawn(store: SessionStore, clock: Arc<dyn TimeSource>) -> (Self, JoinHandle<()>) {
        Self::spawn_with(clock, move |snapshot| {
            let store = store.clone();
            async move { store.save(&snapshot.state, snapshot.saved_at).await }
        })
    }

    /// Like [`spawn`](Self::spawn), with a custom save function.
    pub fn spawn_with<F, Fut>(clock: Arc<dyn TimeSource>, save: F) -> (Self, JoinHandle<()>)
    where
        F: FnMut(SessionSnapshot) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), DbError>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let writer = tokio::spawn(write_latest(rx, save));
        (Self { tx, clock }, writer)
    }
}

impl TickCallback for SessionPersister {
    fn on_tick(&self, outcome: &TickOutcome, state: &SimulationState) {
        if !outcome.is_settled() {
            return;
        }
        let _superseded = self.tx.send_replace(Some(SessionSnapshot {
            saved_at: self.clock.now(),
            state: state.clone(),
        }));
    }
}

/// Write each newest snapshot until the sender is dropped.
async fn write_latest<F, Fut>(mut rx: watch::Receiver<Option<SessionSnapshot>>, mut save: F)
where
    F: FnMut(SessionSnapshot) -> Fut,
    Fut: Future<Output = Result<(), DbError>>,
{
    // `changed` still reports an unseen value after the sender is gone,
    // so the final snapshot is always written.
    while rx.changed().await.is_ok() {
        let Some(snapshot) = rx.borrow_and_update().clone() else {
            continue;
        };
        let ticks_settled = snapshot.state.ticks_settled;
        match save(snapshot).await {
            Ok(()) => debug!(ticks_settled, "Session snapshot written"),
            Err(e) => warn!(error = %e, ticks_settled, "Session save failed"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use architect_core::{PlanTransition, SystemClock, TickReport};
    use architect_types::{ActionKind, Vec3};

    use super::*;

    fn completed() -> TickOutcome {
        TickOutcome::Completed(TickReport {
            action: ActionKind::Wait,
            task_label: String::from("Standby"),
            placed: None,
            plan: PlanTransition::Unchanged,
            learned: None,
            avatar_position: Vec3::ORIGIN,
        })
    }

    #[tokio::test]
    async fn slow_store_writes_in_tick_order_and_keeps_the_newest() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let (persister, writer) = {
            let saved = Arc::clone(&saved);
            SessionPersister::spawn_with(Arc::new(SystemClock), move |snapshot| {
                let saved = Arc::clone(&saved);
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    saved.lock().unwrap().push(snapshot.state.ticks_settled);
                    Ok(())
                }
            })
        };

        let mut state = SimulationState::new("goal");
        for tick in 1..=10 {
            state.ticks_settled = tick;
            persister.on_tick(&completed(), &state);
            tokio::time::sleep(Duration::from_millis(3)).await;
        }
        drop(persister);
        writer.await.unwrap();

        let saved = saved.lock().unwrap().clone();
        assert!(saved.iter().zip(saved.iter().skip(1)).all(|(a, b)| a < b));
        assert_eq!(saved.last(), Some(&10));
    }

    #[tokio::test]
    async fn unsettled_ticks_are_not_saved() {
        let saved = Arc::new(Mutex::new(0_u32));
        let (persister, writer) = {
            let saved = Arc::clone(&saved);
            SessionPersister::spawn_with(Arc::new(SystemClock), move |_snapshot| {
                let saved = Arc::clone(&saved);
                async move {
                    let mut count = saved.lock().unwrap();
                    *count = count.saturating_add(1);
                    Ok(())
                }
            })
        };

        let state = SimulationState::new("goal");
        persister.on_tick(&TickOutcome::Abandoned, &state);
        persister.on_tick(&TickOutcome::Skipped, &state);
        drop(persister);
        writer.await.unwrap();

        assert_eq!(*saved.lock().unwrap(), 0);
    }
}
