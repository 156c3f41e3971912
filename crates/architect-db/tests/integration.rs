//! Integration tests against a live `Dragonfly` instance.
//!
//! Run with:
//!
//! ```bash
//! docker compose up -d
//! cargo test -p architect-db -- --ignored
//! docker compose down
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use architect_db::{DbError, DragonflyPool, SessionStore};
use architect_types::SimulationState;
use chrono::Utc;

/// Dragonfly connection URL for the local Docker instance.
const DRAGONFLY_URL: &str = "redis://localhost:6379";

async fn connect() -> DragonflyPool {
    DragonflyPool::connect(DRAGONFLY_URL)
        .await
        .expect("Failed to connect to Dragonfly -- is Docker running?")
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance (docker compose up -d)"]
async fn json_set_get_delete() {
    let pool = connect().await;
    let key = "architect:test:json";

    pool.set_json(key, &vec![1_u32, 2, 3]).await.unwrap();
    let back: Vec<u32> = pool.get_json(key).await.unwrap();
    assert_eq!(back, vec![1, 2, 3]);

    pool.delete(key).await.unwrap();
    let missing = pool.get_json::<Vec<u32>>(key).await;
    assert!(matches!(missing, Err(DbError::KeyNotFound(_))));
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance (docker compose up -d)"]
async fn session_save_and_restore() {
    let store = SessionStore::new(connect().await, "integration-test");
    store.clear().await.unwrap();
    assert!(store.load().await.unwrap().is_none());

    let mut state = SimulationState::new("Test goal");
    state.ticks_settled = 7;
    store.save(&state, Utc::now()).await.unwrap();

    let restored = store.load().await.unwrap().expect("snapshot present");
    assert_eq!(restored.state, state);

    store.clear().await.unwrap();
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance (docker compose up -d)"]
async fn sessions_do_not_share_keys() {
    let pool = connect().await;
    let a = SessionStore::new(pool.clone(), "integration-a");
    let b = SessionStore::new(pool, "integration-b");
    a.clear().await.unwrap();
    b.clear().await.unwrap();

    a.save(&SimulationState::new("A"), Utc::now()).await.unwrap();
    assert!(b.load().await.unwrap().is_none());

    a.clear().await.unwrap();
}
