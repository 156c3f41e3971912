//! Injectable wall-clock source.
//!
//! Knowledge entries, log lines, and world objects all carry a timestamp.
//! Taking the time from a [`TimeSource`] rather than calling `Utc::now()`
//! inline keeps the ledger and the orchestrator deterministic under test.

use chrono::{DateTime, Utc};

/// A source of "now".
pub trait TimeSource: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl TimeSource for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
