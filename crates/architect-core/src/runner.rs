//! Autonomous loop with operator controls.
//!
//! [`run_autonomous`] drives the orchestrator until a stop is requested:
//!
//! - **Autonomous mode**: the next tick fires `tick_interval_ms` after the
//!   previous one *settled*, so ticks never overlap.
//! - **Manual mode**: ticks fire only on operator request.
//! - **Stop**: pending waits are dropped and an in-flight tick is abandoned.
//!
//! Mode and interval changes restart the wait.

use std::time::Duration;

use architect_types::{LogEntry, SimulationState};
use tracing::{info, warn};

use crate::oracle::DecisionOracle;
use crate::tick::{TickOutcome, TurnOrchestrator};

/// Receives log lines as they are appended and ticks as they settle.
///
/// Both methods are called while the orchestrator holds its state lock;
/// implementations must not call back into the orchestrator.
pub trait TickCallback: Send + Sync {
    /// Called for every log line, in append order.
    fn on_log(&self, _entry: &LogEntry) {}

    /// Called after a tick completes or fails.
    fn on_tick(&self, outcome: &TickOutcome, state: &SimulationState);
}

/// Counters for one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks that completed.
    pub completed: u64,
    /// Ticks that failed before commit.
    pub failed: u64,
    /// Ticks refused by the guard.
    pub skipped: u64,
    /// Whether the last tick was abandoned by the stop.
    pub abandoned: bool,
}

enum Wake {
    Tick,
    Stop,
}

/// Run ticks until the operator requests a stop.
pub async fn run_autonomous<O: DecisionOracle>(orchestrator: &TurnOrchestrator<O>) -> RunSummary {
    let operator = orchestrator.operator();
    let mut summary = RunSummary::default();

    info!(
        mode = ?operator.mode(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Simulation loop starting"
    );

    loop {
        if matches!(wait_for_next_tick(orchestrator).await, Wake::Stop) {
            break;
        }
        match orchestrator.run_tick().await {
            TickOutcome::Completed(_) => summary.completed = summary.completed.saturating_add(1),
            TickOutcome::Failed { .. } => summary.failed = summary.failed.saturating_add(1),
            TickOutcome::Skipped => summary.skipped = summary.skipped.saturating_add(1),
            TickOutcome::Abandoned => {
                summary.abandoned = true;
                break;
            }
        }
    }

    log_run_end(&summary);
    summary
}

async fn wait_for_next_tick<O: DecisionOracle>(orchestrator: &TurnOrchestrator<O>) -> Wake {
    let operator = orchestrator.operator();
    loop {
        let changed = operator.changed();
        if operator.is_stop_requested() {
            return Wake::Stop;
        }
        if operator.take_tick_request() {
            return Wake::Tick;
        }
        if operator.is_autonomous() {
            let interval = Duration::from_millis(operator.tick_interval_ms());
            tokio::select! {
                () = tokio::time::sleep(interval) => return Wake::Tick,
                () = changed => {}
            }
        } else {
            changed.await;
        }
    }
}

/// Log the end of a loop run.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        completed = summary.completed,
        failed = summary.failed,
        skipped = summary.skipped,
        abandoned = summary.abandoned,
        "Simulation loop ended"
    );
    if summary.completed == 0 && summary.failed == 0 {
        warn!("Simulation loop ended with no ticks executed");
    }
}
