//! Core entity structs for the Architect simulation.
//!
//! [`SimulationState`] is the root aggregate. Everything else is either a
//! member of it or a value derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{KnowledgeCategory, LogKind, NetworkStatus, StepStatus, WorldObjectType};
use crate::ids::{KnowledgeId, LogEntryId, PlanId, WorldObjectId};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in world space, `[x, y, z]` with `y` vertical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vec3(pub [f64; 3]);

impl Vec3 {
    /// The world origin.
    pub const ORIGIN: Self = Self([0.0, 0.0, 0.0]);

    /// Unit scale on every axis.
    pub const ONE: Self = Self([1.0, 1.0, 1.0]);

    /// Build a point from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    /// East-west coordinate.
    pub const fn x(self) -> f64 {
        let [x, _, _] = self.0;
        x
    }

    /// Vertical coordinate.
    pub const fn y(self) -> f64 {
        let [_, y, _] = self.0;
        y
    }

    /// North-south coordinate.
    pub const fn z(self) -> f64 {
        let [_, _, z] = self.0;
        z
    }

    /// Same horizontal coordinates at a different height.
    pub const fn with_y(self, y: f64) -> Self {
        Self([self.x(), y, self.z()])
    }

    /// Distance in the ground plane, ignoring height.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn horizontal_distance(self, other: Self) -> f64 {
        (self.x() - other.x()).hypot(self.z() - other.z())
    }

    /// Whether every component is a finite number.
    pub fn is_finite(self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// A placed artifact. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldObject {
    /// Unique identifier.
    pub id: WorldObjectId,
    /// What was placed.
    pub object_type: WorldObjectType,
    /// Terrain-snapped position.
    pub position: Vec3,
    /// Euler rotation in radians.
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
    /// When the placement was committed.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// One unit of work within a [`ConstructionPlan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlanStep {
    /// Short operator-facing label.
    pub label: String,
    /// Object the step places.
    pub object_type: WorldObjectType,
    /// Target position (vertical coordinate is re-snapped on placement).
    pub position: Vec3,
    /// Lifecycle status.
    pub status: StepStatus,
}

/// A multi-step construction plan proposed by the oracle.
///
/// While the plan exists exactly one step is [`StepStatus::Active`] and
/// `current_step_index` points at it. Earlier steps are completed, later
/// steps are pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConstructionPlan {
    /// Unique identifier.
    pub id: PlanId,
    /// What the plan is trying to achieve.
    pub objective: String,
    /// Ordered steps.
    pub steps: Vec<PlanStep>,
    /// Index of the active step.
    #[ts(type = "number")]
    pub current_step_index: usize,
    /// Blueprint the plan was derived from, if any.
    pub source_blueprint: Option<String>,
}

impl ConstructionPlan {
    /// The step at `current_step_index`, if the index is in range.
    pub fn current_step(&self) -> Option<&PlanStep> {
        self.steps.get(self.current_step_index)
    }
}

// ---------------------------------------------------------------------------
// Knowledge
// ---------------------------------------------------------------------------

/// A supporting citation attached to a knowledge entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GroundingLink {
    /// Link target.
    pub uri: String,
    /// Display title.
    pub title: String,
}

/// A learned fact in the knowledge ledger. Titles are unique within a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct KnowledgeEntry {
    /// Unique identifier.
    pub id: KnowledgeId,
    /// Deduplication key.
    pub title: String,
    /// Full learning note.
    pub description: String,
    /// Category.
    pub category: KnowledgeCategory,
    /// Learning iteration that produced this entry.
    pub iteration: u64,
    /// When the entry was indexed.
    pub created_at: DateTime<Utc>,
    /// Supporting citations.
    pub links: Vec<GroundingLink>,
}

// ---------------------------------------------------------------------------
// Log stream
// ---------------------------------------------------------------------------

/// One line in the append-only log stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogEntry {
    /// Unique identifier.
    pub id: LogEntryId,
    /// Tag.
    pub kind: LogKind,
    /// Human-readable text.
    pub message: String,
    /// When the line was appended.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Progression
// ---------------------------------------------------------------------------

/// Progress metrics derived from cumulative placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProgressionStats {
    /// Tier, a step function of `total_blocks`.
    pub complexity_level: u32,
    /// All-time placements.
    pub total_blocks: u64,
    /// Placements of the primary structure type.
    pub structures_completed: u64,
    /// Blueprints available to the oracle. Carried through unchanged.
    pub unlocked_blueprints: Vec<String>,
}

impl Default for ProgressionStats {
    fn default() -> Self {
        Self {
            complexity_level: 1,
            total_blocks: 0,
            structures_completed: 0,
            unlocked_blueprints: vec![
                String::from("Core Protocol"),
                String::from("Adaptive Clustering"),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Root aggregate
// ---------------------------------------------------------------------------

/// The whole simulation. Mutated only by the turn orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationState {
    /// Every placed object, in placement order.
    pub objects: Vec<WorldObject>,
    /// Append-only log stream.
    pub logs: Vec<LogEntry>,
    /// Title-deduplicated knowledge ledger.
    pub knowledge: Vec<KnowledgeEntry>,
    /// Goal handed to the oracle every tick.
    pub current_goal: String,
    /// Operator-facing label for what the orchestrator is doing.
    pub current_task: String,
    /// Coarse progress of the in-flight tick, 0 to 100.
    pub task_progress: u8,
    /// Incremented once per successful placement.
    pub learning_iteration: u64,
    /// Derived progress metrics.
    pub progression: ProgressionStats,
    /// Link status.
    pub network_status: NetworkStatus,
    /// Plan being executed, if any.
    pub active_plan: Option<ConstructionPlan>,
    /// Where the avatar stands (rendering boundary).
    pub avatar_position: Vec3,
    /// Ticks that reached a settled outcome (completed or failed).
    pub ticks_settled: u64,
}

impl SimulationState {
    /// An empty world with the given goal and no log lines.
    pub fn new(current_goal: impl Into<String>) -> Self {
        Self {
            objects: Vec::new(),
            logs: Vec::new(),
            knowledge: Vec::new(),
            current_goal: current_goal.into(),
            current_task: String::from("Analyzing Local Sector..."),
            task_progress: 0,
            learning_iteration: 0,
            progression: ProgressionStats::default(),
            network_status: NetworkStatus::UplinkActive,
            active_plan: None,
            avatar_position: Vec3::ORIGIN,
            ticks_settled: 0,
        }
    }

    /// The most recently placed object.
    pub fn last_object(&self) -> Option<&WorldObject> {
        self.objects.last()
    }

    /// The last `limit` log lines, oldest first.
    pub fn recent_logs(&self, limit: usize) -> &[LogEntry] {
        let start = self.logs.len().saturating_sub(limit);
        self.logs.get(start..).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn vec3_serializes_as_array() {
        let json = serde_json::to_string(&Vec3::new(2.0, 0.5, -5.0)).unwrap();
        assert_eq!(json, "[2.0,0.5,-5.0]");
    }

    #[test]
    fn horizontal_distance_ignores_height() {
        let a = Vec3::new(0.0, 10.0, 0.0);
        let b = Vec3::new(3.0, -4.0, 4.0);
        assert!((a.horizontal_distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_progression_starts_at_tier_one() {
        let stats = ProgressionStats::default();
        assert_eq!(stats.complexity_level, 1);
        assert_eq!(stats.total_blocks, 0);
        assert_eq!(stats.unlocked_blueprints.len(), 2);
    }

    #[test]
    fn recent_logs_returns_tail() {
        let mut state = SimulationState::new("goal");
        for n in 0..5 {
            state.logs.push(LogEntry {
                id: LogEntryId::new(),
                kind: LogKind::Thinking,
                message: format!("line {n}"),
                created_at: Utc::now(),
            });
        }
        let tail = state.recent_logs(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.first().unwrap().message, "line 3");
        assert_eq!(state.recent_logs(50).len(), 5);
    }

    #[test]
    fn plan_current_step_respects_bounds() {
        let plan = ConstructionPlan {
            id: PlanId::new(),
            objective: String::from("Anchor"),
            steps: vec![PlanStep {
                label: String::from("Lay unit"),
                object_type: WorldObjectType::ModularUnit,
                position: Vec3::new(2.0, 0.0, 5.0),
                status: StepStatus::Active,
            }],
            current_step_index: 3,
            source_blueprint: None,
        };
        assert!(plan.current_step().is_none());
    }
}
