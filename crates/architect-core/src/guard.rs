//! Single-flight tick guard.
//!
//! A tick is either running or it is not. [`TickGuard::try_begin`] is the
//! only `Idle -> Running` edge and dropping the returned [`TickPermit`] is
//! the only `Running -> Idle` edge, so a tick that errors, panics, or is
//! cancelled mid-await still releases the guard.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

/// Observable phase of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickPhase {
    /// No tick in flight.
    Idle,
    /// A tick holds the guard.
    Running,
}

/// Two-state machine admitting at most one tick at a time.
#[derive(Debug, Default)]
pub struct TickGuard {
    running: AtomicBool,
}

impl TickGuard {
    /// A guard in the idle phase.
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    /// Enter the running phase. Returns `None` if a tick already holds it.
    pub fn try_begin(&self) -> Option<TickPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickPermit { guard: self })
    }

    /// Current phase.
    pub fn phase(&self) -> TickPhase {
        if self.running.load(Ordering::Acquire) {
            TickPhase::Running
        } else {
            TickPhase::Idle
        }
    }
}

/// Proof that the holder owns the running phase.
#[derive(Debug)]
#[must_use = "dropping the permit immediately ends the tick"]
pub struct TickPermit<'a> {
    guard: &'a TickGuard,
}

impl Drop for TickPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
