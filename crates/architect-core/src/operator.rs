//! Operator control state for runtime simulation management.
//!
//! Shared between the autonomous loop, the orchestrator, and the operator
//! REST API. The operator can switch between autonomous and manual mode,
//! request a single tick, change the tick interval, and stop the
//! simulation, all without restarting the process.
//!
//! # Architecture
//!
//! Control fields are atomics so the loop reads them without locking. Every
//! change fires [`Notify::notify_waiters`] on a single `changed` signal;
//! waiters re-check the atomics after each wakeup.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::sync::futures::Notified;

use architect_types::NetworkStatus;

/// Smallest tick interval the operator API accepts.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// How ticks are triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// A tick fires a fixed interval after the previous one settles.
    Autonomous,
    /// Ticks fire only on operator request.
    Manual,
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether ticks are scheduled automatically.
    autonomous: AtomicBool,

    /// A single tick has been requested and not yet started.
    tick_requested: AtomicBool,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Delay between a tick settling and the next autonomous tick.
    tick_interval_ms: AtomicU64,

    /// Fired on every control change.
    changed: Notify,

    /// Wall-clock time when the session started.
    started_at: DateTime<Utc>,
}

impl OperatorState {
    /// Create operator state in the given mode.
    pub fn new(mode: RunMode, tick_interval_ms: u64) -> Self {
        Self {
            autonomous: AtomicBool::new(mode == RunMode::Autonomous),
            tick_requested: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            changed: Notify::new(),
            started_at: Utc::now(),
        }
    }

    /// A future that completes on the next control change.
    ///
    /// Create it *before* checking the atomics; changes made after creation
    /// are never missed.
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }

    // -----------------------------------------------------------------------
    // Mode
    // -----------------------------------------------------------------------

    /// Current run mode.
    pub fn mode(&self) -> RunMode {
        if self.autonomous.load(Ordering::Acquire) {
            RunMode::Autonomous
        } else {
            RunMode::Manual
        }
    }

    /// Whether ticks are scheduled automatically.
    pub fn is_autonomous(&self) -> bool {
        self.mode() == RunMode::Autonomous
    }

    /// Switch mode. Returns the previous mode.
    pub fn set_mode(&self, mode: RunMode) -> RunMode {
        let prev = self
            .autonomous
            .swap(mode == RunMode::Autonomous, Ordering::AcqRel);
        self.changed.notify_waiters();
        if prev {
            RunMode::Autonomous
        } else {
            RunMode::Manual
        }
    }

    // -----------------------------------------------------------------------
    // Manual ticks
    // -----------------------------------------------------------------------

    /// Ask the loop to run one tick as soon as it is free.
    pub fn request_tick(&self) {
        self.tick_requested.store(true, Ordering::Release);
        self.changed.notify_waiters();
    }

    /// Consume a pending tick request.
    pub fn take_tick_request(&self) -> bool {
        self.tick_requested.swap(false, Ordering::AcqRel)
    }

    /// Whether a tick request is pending.
    pub fn is_tick_requested(&self) -> bool {
        self.tick_requested.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. In-flight ticks are abandoned.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.changed.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Complete once a stop has been requested.
    pub async fn stopped(&self) {
        loop {
            let changed = self.changed();
            if self.is_stop_requested() {
                return;
            }
            changed.await;
        }
    }

    // -----------------------------------------------------------------------
    // Tick Speed
    // -----------------------------------------------------------------------

    /// Get the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval in milliseconds. Must be at least
    /// [`MIN_TICK_INTERVAL_MS`].
    ///
    /// Returns the previous interval on success, or `None` if the value was
    /// rejected.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        let prev = self.tick_interval_ms.swap(ms, Ordering::AcqRel);
        self.changed.notify_waiters();
        Some(prev)
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since session start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Snapshot for the operator API.
    pub fn status(&self, network_status: NetworkStatus, ticks_settled: u64) -> OperatorStatus {
        OperatorStatus {
            mode: self.mode(),
            tick_requested: self.is_tick_requested(),
            stop_requested: self.is_stop_requested(),
            tick_interval_ms: self.tick_interval_ms(),
            elapsed_seconds: self.elapsed_seconds(),
            network_status,
            ticks_settled,
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// JSON-serializable operator status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorStatus {
    /// Autonomous or manual.
    pub mode: RunMode,
    /// Whether a manual tick is queued.
    pub tick_requested: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Link status; `syncing` while a tick is in flight.
    pub network_status: NetworkStatus,
    /// Ticks that have settled this session.
    pub ticks_settled: u64,
    /// ISO 8601 timestamp of when the session started.
    pub started_at: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn initial_state_follows_constructor() {
        let state = OperatorState::new(RunMode::Autonomous, 4500);
        assert!(state.is_autonomous());
        assert!(!state.is_stop_requested());
        assert!(!state.is_tick_requested());

        let manual = OperatorState::new(RunMode::Manual, 4500);
        assert_eq!(manual.mode(), RunMode::Manual);
    }

    #[test]
    fn switch_mode_returns_previous() {
        let state = OperatorState::new(RunMode::Autonomous, 4500);
        assert_eq!(state.set_mode(RunMode::Manual), RunMode::Autonomous);
        assert_eq!(state.set_mode(RunMode::Manual), RunMode::Manual);
        assert!(!state.is_autonomous());
    }

    #[test]
    fn tick_request_is_consumed_once() {
        let state = OperatorState::new(RunMode::Manual, 4500);
        state.request_tick();
        assert!(state.take_tick_request());
        assert!(!state.take_tick_request());
    }

    #[test]
    fn set_tick_interval() {
        let state = OperatorState::new(RunMode::Autonomous, 1000);
        assert_eq!(state.set_tick_interval_ms(2000), Some(1000));
        assert_eq!(state.tick_interval_ms(), 2000);
    }

    #[test]
    fn reject_sub_100ms_interval() {
        let state = OperatorState::new(RunMode::Autonomous, 1000);
        assert!(state.set_tick_interval_ms(50).is_none());
        assert_eq!(state.tick_interval_ms(), 1000);
    }

    #[tokio::test]
    async fn stopped_resolves_after_request() {
        let state = Arc::new(OperatorState::new(RunMode::Autonomous, 1000));
        let waiter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.stopped().await })
        };
        tokio::task::yield_now().await;
        state.request_stop();
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn stopped_resolves_immediately_when_already_stopped() {
        let state = OperatorState::new(RunMode::Manual, 1000);
        state.request_stop();
        let done = tokio::time::timeout(Duration::from_millis(100), state.stopped()).await;
        assert!(done.is_ok());
    }

    #[test]
    fn status_reflects_controls() {
        let state = OperatorState::new(RunMode::Manual, 700);
        state.request_tick();
        let status = state.status(NetworkStatus::Syncing, 4);
        assert_eq!(status.mode, RunMode::Manual);
        assert!(status.tick_requested);
        assert_eq!(status.tick_interval_ms, 700);
        assert_eq!(status.ticks_settled, 4);
    }
}
