//! The turn orchestrator.
//!
//! One tick runs, in order:
//!
//! 1. **Guard** -- refuse to start if a tick is already in flight.
//! 2. **Uplink** -- mark the link `syncing` and stream the opening chatter.
//! 3. **Decide** -- hand the oracle a snapshot and await its decision.
//! 4. **Reason** -- stream each reasoning line as its own log entry.
//! 5. **Act** -- place, relocate, or stand by.
//! 6. **Settle** -- restore the link, label the idle task, notify callbacks.
//!
//! The placement commit in step 5 is all-or-nothing. Everything it writes
//! (world object, plan, knowledge, progression, learning iteration) is
//! computed up front by [`prepare_placement`] against an immutable snapshot
//! and applied by [`Placement::commit`], which cannot fail. A tick that
//! errors before the commit leaves all of those untouched and appends one
//! error log entry instead.
//!
//! A stop request abandons the tick at whichever suspension point it is
//! parked on. An abandoned tick commits nothing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use architect_types::{
    ActionKind, ConstructionPlan, Decision, DecisionAction, KnowledgeEntry, LogEntry, LogEntryId,
    LogKind, NetworkStatus, ProgressionStats, SimulationState, Vec3, WorldObject, WorldObjectId,
    WorldObjectType,
};
use architect_world::{TerrainSampler, WaveTerrain, WorldError};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clock::{SystemClock, TimeSource};
use crate::config::PacingConfig;
use crate::guard::{TickGuard, TickPhase};
use crate::knowledge::{self, KnowledgeCandidate};
use crate::oracle::{DecisionOracle, OracleContext};
use crate::operator::OperatorState;
use crate::plan::{self, PlanError, PlanTransition};
use crate::progression;
use crate::runner::TickCallback;

/// Object placed when neither the decision nor the plan names one.
pub const DEFAULT_PLACEMENT: WorldObjectType = WorldObjectType::ModularUnit;

/// Log line a fresh session starts with.
pub const BOOT_MESSAGE: &str = "Architect-OS Online. Neural pathways clear.";

/// Errors that abort a tick before its commit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TickError {
    /// The active or proposed plan breaks the step invariant.
    #[error("plan invariant violated: {source}")]
    Plan {
        /// The underlying plan error.
        #[from]
        source: PlanError,
    },

    /// A target position could not be snapped to the terrain.
    #[error("terrain snap failed: {source}")]
    Terrain {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// What a completed tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// The action the oracle chose.
    pub action: ActionKind,
    /// The oracle's task label.
    pub task_label: String,
    /// The object placed, for a placement.
    pub placed: Option<WorldObject>,
    /// What happened to the plan.
    pub plan: PlanTransition,
    /// Title of the knowledge entry added, if the ledger grew.
    pub learned: Option<String>,
    /// Where the avatar ended up.
    pub avatar_position: Vec3,
}

/// How a call to [`TurnOrchestrator::run_tick`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Another tick held the guard. Nothing happened.
    Skipped,
    /// The tick ran to completion.
    Completed(TickReport),
    /// The tick failed before its commit. State is as it was, plus logs.
    Failed {
        /// Why.
        error: TickError,
    },
    /// A stop request interrupted the tick. Nothing was committed.
    Abandoned,
}

impl TickOutcome {
    /// Whether the tick reached a settled result (completed or failed).
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed { .. })
    }
}

/// The precomputed result of a placement, ready to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// The new world object.
    pub object: WorldObject,
    /// Plan after the placement.
    pub plan: Option<ConstructionPlan>,
    /// What happened to the plan.
    pub plan_transition: PlanTransition,
    /// Ledger after the placement.
    pub knowledge: Vec<KnowledgeEntry>,
    /// Title of the entry added, if any.
    pub learned: Option<String>,
    /// Progression after the placement.
    pub progression: ProgressionStats,
    /// Learning iteration after the placement.
    pub learning_iteration: u64,
}

impl Placement {
    /// Apply every change at once.
    pub fn commit(self, state: &mut SimulationState) {
        state.objects.push(self.object);
        state.active_plan = self.plan;
        state.knowledge = self.knowledge;
        state.progression = self.progression;
        state.learning_iteration = self.learning_iteration;
    }
}

/// Compute everything a placement will change, without changing anything.
///
/// The object type and position come from the decision when present,
/// otherwise from the current step of the effective plan (the newly
/// proposed one if any, else the active one), otherwise from
/// [`DEFAULT_PLACEMENT`] at the origin. The position's height is always
/// replaced by the terrain height.
pub fn prepare_placement(
    state: &SimulationState,
    object_type: Option<WorldObjectType>,
    position: Option<Vec3>,
    decision: &Decision,
    terrain: &dyn TerrainSampler,
    now: DateTime<Utc>,
) -> Result<Placement, TickError> {
    let target_plan = decision.plan.as_ref().or(state.active_plan.as_ref());
    if let Some(plan) = target_plan {
        plan::validate(plan)?;
    }
    let step = target_plan.and_then(ConstructionPlan::current_step);

    let object_type = object_type
        .or_else(|| step.map(|s| s.object_type))
        .unwrap_or(DEFAULT_PLACEMENT);
    let position = position
        .or_else(|| step.map(|s| s.position))
        .unwrap_or(Vec3::ORIGIN);
    let position = terrain.try_snap(position)?;

    let (plan, plan_transition) = plan::transition(
        state.active_plan.clone(),
        decision.plan.clone(),
        ActionKind::Place,
    )?;

    let iteration = state.learning_iteration;
    let knowledge = knowledge::append(
        state.knowledge.clone(),
        KnowledgeCandidate {
            note: decision.learning_note.clone(),
            category: decision.knowledge_category,
            iteration,
            links: decision.grounding_links.clone(),
        },
        now,
    );
    let learned = (knowledge.len() > state.knowledge.len())
        .then(|| knowledge::derive_title(&decision.learning_note));

    Ok(Placement {
        object: WorldObject {
            id: WorldObjectId::new(),
            object_type,
            position,
            rotation: Vec3::ORIGIN,
            scale: Vec3::ONE,
            created_at: now,
        },
        plan,
        plan_transition,
        knowledge,
        learned,
        progression: progression::update(&state.progression, object_type),
        learning_iteration: iteration.saturating_add(1),
    })
}

/// A fresh session: empty world, the given goal, and the boot log line.
pub fn bootstrap_state(goal: &str, now: DateTime<Utc>) -> SimulationState {
    let mut state = SimulationState::new(goal);
    state.logs.push(LogEntry {
        id: LogEntryId::new(),
        kind: LogKind::Success,
        message: BOOT_MESSAGE.to_owned(),
        created_at: now,
    });
    state
}

/// Owns the simulation state and runs ticks against it, one at a time.
pub struct TurnOrchestrator<O> {
    state: Arc<RwLock<SimulationState>>,
    guard: TickGuard,
    oracle: O,
    operator: Arc<OperatorState>,
    terrain: Arc<dyn TerrainSampler>,
    clock: Arc<dyn TimeSource>,
    pacing: PacingConfig,
    recent_log_window: usize,
    callbacks: Vec<Arc<dyn TickCallback>>,
}

impl<O> core::fmt::Debug for TurnOrchestrator<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("phase", &self.guard.phase())
            .field("pacing", &self.pacing)
            .field("recent_log_window", &self.recent_log_window)
            .field("callbacks", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

impl<O: DecisionOracle> TurnOrchestrator<O> {
    /// An orchestrator over `state` with default terrain, system clock,
    /// default pacing, and a 20-line history window.
    pub fn new(oracle: O, state: SimulationState, operator: Arc<OperatorState>) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            guard: TickGuard::new(),
            oracle,
            operator,
            terrain: Arc::new(WaveTerrain::default()),
            clock: Arc::new(SystemClock),
            pacing: PacingConfig::default(),
            recent_log_window: 20,
            callbacks: Vec::new(),
        }
    }

    /// Use a different terrain.
    #[must_use]
    pub fn with_terrain(mut self, terrain: Arc<dyn TerrainSampler>) -> Self {
        self.terrain = terrain;
        self
    }

    /// Use a different time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Use different pacing delays.
    #[must_use]
    pub const fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Offer the oracle the last `lines` log lines.
    #[must_use]
    pub const fn with_recent_log_window(mut self, lines: usize) -> Self {
        self.recent_log_window = lines;
        self
    }

    /// Register a callback for log lines and settled ticks.
    #[must_use]
    pub fn with_callback(mut self, callback: Arc<dyn TickCallback>) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// The oracle.
    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Shared operator controls.
    pub const fn operator(&self) -> &Arc<OperatorState> {
        &self.operator
    }

    /// Whether a tick is in flight.
    pub fn phase(&self) -> TickPhase {
        self.guard.phase()
    }

    /// The live state, for read-only observers. Writers must go through
    /// the orchestrator.
    pub fn shared_state(&self) -> Arc<RwLock<SimulationState>> {
        Arc::clone(&self.state)
    }

    /// A clone of the current state.
    pub async fn snapshot(&self) -> SimulationState {
        self.state.read().await.clone()
    }

    /// Replace the whole state, e.g. with a restored session. Refused while
    /// a tick is in flight.
    pub async fn restore(&self, state: SimulationState) -> bool {
        let Some(_permit) = self.guard.try_begin() else {
            return false;
        };
        *self.state.write().await = state;
        true
    }

    /// Run one tick. Returns [`TickOutcome::Skipped`] without side effects if
    /// another tick is in flight.
    pub async fn run_tick(&self) -> TickOutcome {
        let Some(_permit) = self.guard.try_begin() else {
            debug!("Tick already in flight, skipping");
            return TickOutcome::Skipped;
        };

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            () = self.operator.stopped() => TickOutcome::Abandoned,
            outcome = self.execute() => outcome,
        };
        self.settle(&outcome, started).await;
        outcome
    }

    // -----------------------------------------------------------------------
    // Tick body
    // -----------------------------------------------------------------------

    async fn execute(&self) -> TickOutcome {
        {
            let mut state = self.state.write().await;
            state.network_status = NetworkStatus::Syncing;
            state.task_progress = 5;
            self.push_log(&mut state, LogKind::Thinking, "Initiating Neural Uplink...");
        }
        pause(self.pacing.uplink()).await;
        self.log(LogKind::Thinking, "Accessing local sector topology map...")
            .await;
        pause(self.pacing.topology()).await;
        self.state.write().await.task_progress = 20;

        let decision = self.consult_oracle().await;
        self.state.write().await.task_progress = 40;

        for step in &decision.reasoning_steps {
            self.log(LogKind::Thinking, &format!("[REASONING]: {step}"))
                .await;
            pause(self.pacing.reasoning_step()).await;
        }
        {
            let mut state = self.state.write().await;
            state.current_task.clone_from(&decision.task_label);
            state.task_progress = 70;
        }

        match self.act(&decision).await {
            Ok(report) => TickOutcome::Completed(report),
            Err(error) => {
                warn!(error = %error, "Tick failed before commit");
                self.log(LogKind::Error, "Critical neural desync. Link unstable.")
                    .await;
                TickOutcome::Failed { error }
            }
        }
    }

    async fn consult_oracle(&self) -> Decision {
        let snapshot = self.snapshot().await;
        let context = OracleContext {
            recent_logs: snapshot.recent_logs(self.recent_log_window),
            objects: &snapshot.objects,
            goal: &snapshot.current_goal,
            knowledge: &snapshot.knowledge,
            terrain: self.terrain.as_ref(),
            active_plan: snapshot.active_plan.as_ref(),
        };
        let decision = self.oracle.decide(&context).await;
        info!(
            action = ?decision.action.kind(),
            task = %decision.task_label,
            reasoning_steps = decision.reasoning_steps.len(),
            proposes_plan = decision.plan.is_some(),
            "Oracle decision received"
        );
        decision
    }

    async fn act(&self, decision: &Decision) -> Result<TickReport, TickError> {
        match decision.action {
            DecisionAction::Place {
                object_type,
                position,
            } => self.place(decision, object_type, position).await,
            DecisionAction::Move {
                position: Some(target),
            } => {
                let snapped = self.terrain.try_snap(target)?;
                let mut state = self.state.write().await;
                state.avatar_position = snapped;
                self.push_log(
                    &mut state,
                    LogKind::Action,
                    "Relocating: Optimizing sector positioning.",
                );
                Ok(report(decision, None, PlanTransition::Unchanged, None, snapped))
            }
            DecisionAction::Move { position: None } | DecisionAction::Wait => {
                let mut state = self.state.write().await;
                self.push_log(
                    &mut state,
                    LogKind::Action,
                    &format!("Simulation standby: {}", decision.reason),
                );
                let avatar = state.avatar_position;
                Ok(report(decision, None, PlanTransition::Unchanged, None, avatar))
            }
        }
    }

    async fn place(
        &self,
        decision: &Decision,
        object_type: Option<WorldObjectType>,
        position: Option<Vec3>,
    ) -> Result<TickReport, TickError> {
        let placement = {
            let state = self.state.read().await;
            prepare_placement(
                &state,
                object_type,
                position,
                decision,
                self.terrain.as_ref(),
                self.clock.now(),
            )?
        };
        // Nothing is written until after the pause; a stop during it
        // must leave the world untouched.
        pause(self.pacing.placement()).await;

        let target = placement.object.position;
        let placed = placement.object.clone();
        let transition = placement.plan_transition;
        let learned = placement.learned.clone();
        {
            let mut state = self.state.write().await;
            self.push_log(
                &mut state,
                LogKind::Success,
                &format!("Synthesis Confirmed: Deploying {} unit.", placed.object_type),
            );
            state.avatar_position = target;
            state.task_progress = 100;
            placement.commit(&mut state);
            if transition == PlanTransition::Completed {
                self.push_log(&mut state, LogKind::Success, "Strategic Objective Achieved.");
            }
            if let Some(title) = &learned {
                self.push_log(
                    &mut state,
                    LogKind::Learning,
                    &format!("Knowledge indexed: {title}"),
                );
            }
            info!(
                object_type = %placed.object_type,
                x = placed.position.x(),
                z = placed.position.z(),
                total_blocks = state.progression.total_blocks,
                complexity_level = state.progression.complexity_level,
                plan = ?transition,
                "Placement committed"
            );
        }
        Ok(report(decision, Some(placed), transition, learned, target))
    }

    async fn settle(&self, outcome: &TickOutcome, started: Instant) {
        let mut state = self.state.write().await;
        state.network_status = NetworkStatus::UplinkActive;
        state.task_progress = 0;
        state.current_task = if self.operator.is_autonomous() {
            String::from("Scanning Topology...")
        } else {
            String::from("Standby")
        };
        if !outcome.is_settled() {
            info!("Tick abandoned");
            return;
        }
        state.ticks_settled = state.ticks_settled.saturating_add(1);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            tick = state.ticks_settled,
            elapsed_ms,
            failed = matches!(outcome, TickOutcome::Failed { .. }),
            "Tick settled"
        );
        for callback in &self.callbacks {
            callback.on_tick(outcome, &state);
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn log(&self, kind: LogKind, message: &str) {
        let mut state = self.state.write().await;
        self.push_log(&mut state, kind, message);
    }

    fn push_log(&self, state: &mut SimulationState, kind: LogKind, message: &str) {
        let entry = LogEntry {
            id: LogEntryId::new(),
            kind,
            message: message.to_owned(),
            created_at: self.clock.now(),
        };
        debug!(kind = ?kind, message, "Log appended");
        for callback in &self.callbacks {
            callback.on_log(&entry);
        }
        state.logs.push(entry);
    }
}

fn report(
    decision: &Decision,
    placed: Option<WorldObject>,
    plan: PlanTransition,
    learned: Option<String>,
    avatar_position: Vec3,
) -> TickReport {
    TickReport {
        action: decision.action.kind(),
        task_label: decision.task_label.clone(),
        placed,
        plan,
        learned,
        avatar_position,
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
