//! Shared type definitions for the Architect construction simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Architect workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the viewer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for every record identifier
//! - [`enums`] -- Closed vocabularies (object types, categories, log tags)
//! - [`structs`] -- World objects, plans, knowledge, logs, and the root state
//! - [`decision`] -- The validated oracle decision record

pub mod decision;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use decision::{Decision, DecisionAction};
pub use enums::{ActionKind, KnowledgeCategory, LogKind, NetworkStatus, StepStatus, WorldObjectType};
pub use ids::{KnowledgeId, LogEntryId, PlanId, WorldObjectId};
pub use structs::{
    ConstructionPlan, GroundingLink, KnowledgeEntry, LogEntry, PlanStep, ProgressionStats,
    SimulationState, Vec3, WorldObject,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files land in `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::WorldObjectId::export_all();
        let _ = crate::ids::PlanId::export_all();
        let _ = crate::ids::KnowledgeId::export_all();
        let _ = crate::ids::LogEntryId::export_all();

        // Enums
        let _ = crate::enums::WorldObjectType::export_all();
        let _ = crate::enums::KnowledgeCategory::export_all();
        let _ = crate::enums::StepStatus::export_all();
        let _ = crate::enums::LogKind::export_all();
        let _ = crate::enums::NetworkStatus::export_all();
        let _ = crate::enums::ActionKind::export_all();

        // Structs
        let _ = crate::structs::Vec3::export_all();
        let _ = crate::structs::WorldObject::export_all();
        let _ = crate::structs::PlanStep::export_all();
        let _ = crate::structs::ConstructionPlan::export_all();
        let _ = crate::structs::GroundingLink::export_all();
        let _ = crate::structs::KnowledgeEntry::export_all();
        let _ = crate::structs::LogEntry::export_all();
        let _ = crate::structs::ProgressionStats::export_all();
        let _ = crate::structs::SimulationState::export_all();

        // Decisions
        let _ = crate::decision::DecisionAction::export_all();
        let _ = crate::decision::Decision::export_all();
    }
}
