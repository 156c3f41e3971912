//! The normalized decision record produced by the oracle adapter.
//!
//! The oracle speaks loosely-typed JSON. By the time a [`Decision`] exists the
//! adapter has already validated and repaired it, so orchestration code can
//! match on [`DecisionAction`] without re-checking anything.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, KnowledgeCategory, WorldObjectType};
use crate::structs::{ConstructionPlan, GroundingLink, Vec3};

/// The action chosen for a tick, with its per-variant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "UPPERCASE")]
#[ts(export, export_to = "bindings/")]
pub enum DecisionAction {
    /// Place an object. Missing fields are filled from the active plan.
    Place {
        /// Requested object type.
        object_type: Option<WorldObjectType>,
        /// Requested position.
        position: Option<Vec3>,
    },
    /// Relocate the avatar. Without a position this degrades to standby.
    Move {
        /// Requested destination.
        position: Option<Vec3>,
    },
    /// Hold position.
    Wait,
}

impl DecisionAction {
    /// The bare action tag.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Place { .. } => ActionKind::Place,
            Self::Move { .. } => ActionKind::Move,
            Self::Wait => ActionKind::Wait,
        }
    }
}

/// One validated oracle response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Decision {
    /// What to do.
    pub action: DecisionAction,
    /// The oracle's stated rationale.
    pub reason: String,
    /// Between three and five reasoning lines, streamed to the log in order.
    pub reasoning_steps: Vec<String>,
    /// Note folded into the knowledge ledger on placement.
    pub learning_note: String,
    /// Category for the knowledge entry.
    pub knowledge_category: KnowledgeCategory,
    /// Operator-facing label for the tick.
    pub task_label: String,
    /// A newly proposed plan, already repaired so step 0 is active.
    pub plan: Option<ConstructionPlan>,
    /// Citations for the learning note.
    pub grounding_links: Vec<GroundingLink>,
}
