//! Decision oracle trait, canonical fallback, and offline implementations.
//!
//! Once per tick the orchestrator hands the oracle an [`OracleContext`] and
//! awaits a [`Decision`]. The oracle never fails from the orchestrator's
//! point of view: transport errors, timeouts, and garbage payloads all
//! resolve to [`fallback_decision`] inside the implementation.
//!
//! [`StubOracle`] always waits. [`ScriptedOracle`] replays a queue of
//! decisions and records what it was shown, for tests and offline demos.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use architect_types::{
    ConstructionPlan, Decision, DecisionAction, KnowledgeCategory, KnowledgeEntry, LogEntry,
    WorldObject,
};
use architect_world::TerrainSampler;

/// Everything the oracle may look at for one decision. Borrowed from an
/// immutable snapshot of the simulation.
#[derive(Clone, Copy)]
pub struct OracleContext<'a> {
    /// The most recent log lines, oldest first.
    pub recent_logs: &'a [LogEntry],
    /// Every placed object, in placement order.
    pub objects: &'a [WorldObject],
    /// Current goal.
    pub goal: &'a str,
    /// The knowledge ledger.
    pub knowledge: &'a [KnowledgeEntry],
    /// Ground elevation.
    pub terrain: &'a dyn TerrainSampler,
    /// The plan being executed, if any.
    pub active_plan: Option<&'a ConstructionPlan>,
}

impl core::fmt::Debug for OracleContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OracleContext")
            .field("recent_logs", &self.recent_logs.len())
            .field("objects", &self.objects.len())
            .field("goal", &self.goal)
            .field("knowledge", &self.knowledge.len())
            .field("active_plan", &self.active_plan.map(|p| p.id))
            .finish_non_exhaustive()
    }
}

/// A source of decisions.
pub trait DecisionOracle: Send + Sync {
    /// Decide what to do this tick. Must always produce a decision.
    fn decide(&self, context: &OracleContext<'_>) -> impl Future<Output = Decision> + Send;
}

/// The decision substituted whenever the oracle cannot be reached or
/// returns something unusable.
pub fn fallback_decision() -> Decision {
    Decision {
        action: DecisionAction::Wait,
        reason: String::from("Neural desync. Re-aligning logic gates."),
        reasoning_steps: vec![
            String::from("Connection failure detected"),
            String::from("Re-routing synthesis request"),
            String::from("Flushing instruction cache"),
        ],
        learning_note: String::from("Logic gate misalignment detected during planning phase."),
        knowledge_category: KnowledgeCategory::Synthesis,
        task_label: String::from("Recalibrating..."),
        plan: None,
        grounding_links: Vec::new(),
    }
}

/// An oracle that always returns [`fallback_decision`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StubOracle;

impl DecisionOracle for StubOracle {
    async fn decide(&self, _context: &OracleContext<'_>) -> Decision {
        fallback_decision()
    }
}

/// What a [`ScriptedOracle`] was shown on one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedCall {
    /// Goal string.
    pub goal: String,
    /// Number of log lines offered.
    pub recent_logs: usize,
    /// Number of placed objects.
    pub objects: usize,
    /// Number of knowledge entries.
    pub knowledge: usize,
    /// Label of the active plan step, if a plan was active.
    pub active_step: Option<String>,
}

/// Replays queued decisions in order, then falls back.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    queue: Mutex<VecDeque<Decision>>,
    observed: Mutex<Vec<ObservedCall>>,
    calls: AtomicUsize,
    latency: Duration,
}

impl ScriptedOracle {
    /// An oracle that answers with `decisions`, one per call.
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            queue: Mutex::new(decisions.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Delay every answer by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue another decision.
    pub fn push(&self, decision: Decision) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(decision);
    }

    /// Number of times [`decide`](DecisionOracle::decide) has been entered.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    /// Every context seen so far, in call order.
    pub fn observed(&self) -> Vec<ObservedCall> {
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DecisionOracle for ScriptedOracle {
    async fn decide(&self, context: &OracleContext<'_>) -> Decision {
        self.calls.fetch_add(1, Ordering::AcqRel);
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ObservedCall {
                goal: context.goal.to_owned(),
                recent_logs: context.recent_logs.len(),
                objects: context.objects.len(),
                knowledge: context.knowledge.len(),
                active_step: context
                    .active_plan
                    .and_then(ConstructionPlan::current_step)
                    .map(|s| s.label.clone()),
            });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        next.unwrap_or_else(fallback_decision)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use architect_types::ActionKind;
    use architect_world::WaveTerrain;

    use super::*;

    fn context<'a>(terrain: &'a WaveTerrain) -> OracleContext<'a> {
        OracleContext {
            recent_logs: &[],
            objects: &[],
            goal: "Test goal",
            knowledge: &[],
            terrain,
            active_plan: None,
        }
    }

    #[test]
    fn fallback_is_a_three_step_wait() {
        let decision = fallback_decision();
        assert_eq!(decision.action.kind(), ActionKind::Wait);
        assert_eq!(decision.reasoning_steps.len(), 3);
        assert_eq!(decision.knowledge_category, KnowledgeCategory::Synthesis);
        assert_eq!(decision.task_label, "Recalibrating...");
    }

    #[tokio::test]
    async fn stub_always_waits() {
        let terrain = WaveTerrain::default();
        let decision = StubOracle.decide(&context(&terrain)).await;
        assert_eq!(decision, fallback_decision());
    }

    #[tokio::test]
    async fn scripted_replays_then_falls_back() {
        let terrain = WaveTerrain::default();
        let mut first = fallback_decision();
        first.reason = String::from("scripted");
        let oracle = ScriptedOracle::new([first.clone()]);

        assert_eq!(oracle.decide(&context(&terrain)).await, first);
        assert_eq!(oracle.decide(&context(&terrain)).await, fallback_decision());
        assert_eq!(oracle.calls(), 2);
        assert_eq!(oracle.observed().first().unwrap().goal, "Test goal");
    }
}
