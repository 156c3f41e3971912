//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds a read handle on the orchestrator's live simulation
//! state, the operator controls, the optional LLM oracle for the raw
//! pass-through, and the broadcast channel feeding `WebSocket` clients.
//!
//! `AppState` is also a [`TickCallback`]: registered with the
//! orchestrator, it republishes every log line and settled tick on the
//! broadcast channel.

use std::sync::Arc;

use architect_core::operator::OperatorState;
use architect_core::{TickCallback, TickOutcome};
use architect_oracle::LlmOracle;
use architect_types::{ActionKind, LogEntry, NetworkStatus, SimulationState, WorldObject};
use tokio::sync::{RwLock, broadcast};

/// Capacity of the broadcast channel.
///
/// A subscriber more than this many messages behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest message.
const BROADCAST_CAPACITY: usize = 1024;

/// Summary of one settled tick pushed over the `WebSocket`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TickBroadcast {
    /// Settled-tick counter after this tick.
    pub tick: u64,
    /// Whether the tick completed (as opposed to failing before commit).
    pub completed: bool,
    /// Action the oracle chose, for completed ticks.
    pub action: Option<ActionKind>,
    /// Task label shown while the tick ran.
    pub task_label: Option<String>,
    /// The object placed this tick.
    pub placed: Option<WorldObject>,
    /// Failure description, for failed ticks.
    pub error: Option<String>,
    /// All-time placements.
    pub total_blocks: u64,
    /// Current complexity tier.
    pub complexity_level: u32,
    /// Knowledge ledger size.
    pub knowledge_count: usize,
    /// Whether a plan is being executed.
    pub plan_active: bool,
    /// Link status after settling.
    pub network_status: NetworkStatus,
}

impl TickBroadcast {
    /// Summarize a settled tick. Returns `None` for outcomes that did not
    /// settle.
    pub fn from_outcome(outcome: &TickOutcome, state: &SimulationState) -> Option<Self> {
        let (completed, action, task_label, placed, error) = match outcome {
            TickOutcome::Completed(report) => (
                true,
                Some(report.action),
                Some(report.task_label.clone()),
                report.placed.clone(),
                None,
            ),
            TickOutcome::Failed { error } => (false, None, None, None, Some(error.to_string())),
            TickOutcome::Skipped | TickOutcome::Abandoned => return None,
        };
        Some(Self {
            tick: state.ticks_settled,
            completed,
            action,
            task_label,
            placed,
            error,
            total_blocks: state.progression.total_blocks,
            complexity_level: state.progression.complexity_level,
            knowledge_count: state.knowledge.len(),
            plan_active: state.active_plan.is_some(),
            network_status: state.network_status,
        })
    }
}

/// One frame on the stream.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// A log line, as soon as it is appended.
    Log(LogEntry),
    /// A tick settled.
    Tick(TickBroadcast),
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for stream messages.
    pub tx: broadcast::Sender<StreamMessage>,
    /// The orchestrator's live state. Read-only from here.
    pub snapshot: Arc<RwLock<SimulationState>>,
    /// Shared operator control state (present when the simulation is running).
    pub operator_state: Option<Arc<OperatorState>>,
    /// Oracle used by the raw decision pass-through.
    pub oracle: Option<Arc<LlmOracle>>,
}

impl AppState {
    /// State over `snapshot` with nothing else attached.
    pub fn new(snapshot: Arc<RwLock<SimulationState>>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            snapshot,
            operator_state: None,
            oracle: None,
        }
    }

    /// Attach operator controls.
    #[must_use]
    pub fn with_operator(mut self, operator: Arc<OperatorState>) -> Self {
        self.operator_state = Some(operator);
        self
    }

    /// Attach the oracle used by `POST /api/simulation/decide`.
    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<LlmOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Subscribe to the stream.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamMessage> {
        self.tx.subscribe()
    }

    /// Publish a message to all connected clients.
    ///
    /// Returns the number of receivers, 0 when nobody is connected.
    pub fn broadcast(&self, message: StreamMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }
}

impl core::fmt::Debug for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppState")
            .field("subscribers", &self.tx.receiver_count())
            .field("operator_state", &self.operator_state.is_some())
            .field("oracle", &self.oracle.is_some())
            .finish_non_exhaustive()
    }
}

impl TickCallback for AppState {
    fn on_log(&self, entry: &LogEntry) {
        self.broadcast(StreamMessage::Log(entry.clone()));
    }

    fn on_tick(&self, outcome: &TickOutcome, state: &SimulationState) {
        if let Some(summary) = TickBroadcast::from_outcome(outcome, state) {
            self.broadcast(StreamMessage::Tick(summary));
        }
    }
}
