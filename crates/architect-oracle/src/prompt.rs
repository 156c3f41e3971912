//! Prompt template loading and rendering via `minijinja`.
//!
//! Two templates make up a prompt: `system.j2` (role, protocols, output
//! contract) and `request.j2` (the per-tick situation report). Both ship
//! compiled into the crate; a templates directory may override either one
//! so operators can tune the oracle without recompiling.

use std::path::Path;

use architect_core::OracleContext;
use architect_types::{ConstructionPlan, KnowledgeCategory, WorldObjectType};
use architect_world::SpatialDigest;
use minijinja::Environment;
use serde::Serialize;

use crate::error::OracleError;

const BUILTIN_SYSTEM: &str = include_str!("../templates/system.j2");
const BUILTIN_REQUEST: &str = include_str!("../templates/request.j2");

/// Everything the templates can refer to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptInput {
    /// Current goal.
    pub goal: String,
    /// Knowledge categories, comma separated.
    pub categories: String,
    /// Object types, comma separated.
    pub object_types: String,
    /// Size of the knowledge ledger.
    pub knowledge_count: usize,
    /// Elevation grid around the last placement.
    pub elevation_data: String,
    /// Objects near the last placement, or `Sector clear.`.
    pub scan_results: String,
    /// Whether a plan is being executed.
    pub plan_active: bool,
    /// Label of the active plan step.
    pub current_step: Option<String>,
    /// Recent log lines as `[kind] message`.
    pub recent_logs: Vec<String>,
}

impl PromptInput {
    /// Build the situation report for one tick.
    pub fn from_context(context: &OracleContext<'_>) -> Self {
        let digest = SpatialDigest::scan(context.objects, context.terrain);
        Self {
            elevation_data: digest.elevation_report(),
            scan_results: digest.scan_report(),
            plan_active: context.active_plan.is_some(),
            current_step: context
                .active_plan
                .and_then(ConstructionPlan::current_step)
                .map(|step| step.label.clone()),
            recent_logs: context
                .recent_logs
                .iter()
                .map(|entry| format!("[{}] {}", entry.kind.as_str(), entry.message))
                .collect(),
            ..Self::for_goal(context.goal, context.knowledge.len())
        }
    }

    /// Input carrying only what the system template needs.
    pub fn for_goal(goal: &str, knowledge_count: usize) -> Self {
        Self {
            goal: goal.to_owned(),
            categories: KnowledgeCategory::ALL.map(KnowledgeCategory::as_str).join(", "),
            object_types: WorldObjectType::ALL.map(WorldObjectType::as_str).join(", "),
            knowledge_count,
            elevation_data: String::new(),
            scan_results: String::from("Sector clear."),
            plan_active: false,
            current_step: None,
            recent_logs: Vec::new(),
        }
    }
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System instruction.
    pub system: String,
    /// User message.
    pub user: String,
}

/// Holds the loaded templates.
#[derive(Debug)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// An engine over the compiled-in templates.
    pub fn builtin() -> Result<Self, OracleError> {
        Self::new(None)
    }

    /// An engine that prefers templates found in `templates_dir`.
    ///
    /// Files missing from the directory fall back to the built-ins. A file
    /// that exists but cannot be read or compiled is an error.
    pub fn new(templates_dir: Option<&Path>) -> Result<Self, OracleError> {
        let mut env = Environment::new();
        for (name, builtin) in [("system", BUILTIN_SYSTEM), ("request", BUILTIN_REQUEST)] {
            let source = load_template(templates_dir, name, builtin)?;
            env.add_template_owned(name, source)
                .map_err(|e| OracleError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Render both templates.
    pub fn render(&self, input: &PromptInput) -> Result<RenderedPrompt, OracleError> {
        Ok(RenderedPrompt {
            system: self.render_one("system", input)?,
            user: self.render_one("request", input)?,
        })
    }

    /// Render only the system instruction.
    pub fn render_system(&self, input: &PromptInput) -> Result<String, OracleError> {
        self.render_one("system", input)
    }

    fn render_one(&self, name: &str, input: &PromptInput) -> Result<String, OracleError> {
        self.env
            .get_template(name)
            .map_err(|e| OracleError::Template(format!("missing {name} template: {e}")))?
            .render(input)
            .map_err(|e| OracleError::Template(format!("{name} render failed: {e}")))
    }
}

fn load_template(dir: Option<&Path>, name: &str, builtin: &str) -> Result<String, OracleError> {
    let Some(dir) = dir else {
        return Ok(builtin.to_owned());
    };
    let path = dir.join(format!("{name}.j2"));
    match std::fs::read_to_string(&path) {
        Ok(source) => Ok(source),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(builtin.to_owned()),
        Err(e) => Err(OracleError::Template(format!(
            "failed to read {}: {e}",
            path.display()
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use architect_types::{
        LogEntry, LogEntryId, LogKind, PlanId, PlanStep, StepStatus, Vec3, WorldObject,
        WorldObjectId,
    };
    use architect_world::WaveTerrain;
    use chrono::Utc;

    use super::*;

    fn plan() -> ConstructionPlan {
        ConstructionPlan {
            id: PlanId::new(),
            objective: String::from("Solar ring"),
            steps: vec![PlanStep {
                label: String::from("Lay first panel"),
                object_type: WorldObjectType::SolarPanel,
                position: Vec3::new(3.0, 0.0, 0.0),
                status: StepStatus::Active,
            }],
            current_step_index: 0,
            source_blueprint: None,
        }
    }

    #[test]
    fn builtin_request_for_empty_world() {
        let terrain = WaveTerrain::default();
        let context = OracleContext {
            recent_logs: &[],
            objects: &[],
            goal: "Synthesize Sustainable Modular Settlement",
            knowledge: &[],
            terrain: &terrain,
            active_plan: None,
        };
        let engine = PromptEngine::builtin().unwrap();
        let prompt = engine.render(&PromptInput::from_context(&context)).unwrap();

        assert!(prompt.user.contains("GOAL: Synthesize Sustainable Modular Settlement"));
        assert!(prompt.user.contains("SCAN_RESULTS: Sector clear."));
        assert!(prompt.user.contains("KNOWLEDGE_COUNT: 0"));
        assert!(prompt.user.contains("PLAN_ACTIVE: false\n"));
        assert!(!prompt.user.contains("False"));
        assert!(prompt.user.contains("INITIATING NEW SEQUENCE..."));
        assert!(prompt.user.contains("[-6.0, -6.0]: elev="));
        assert!(!prompt.user.contains("RECENT_LOGS"));
        assert!(prompt.system.contains("Architect-OS"));
        assert!(prompt.system.contains("Infrastructure, Energy, Environment, Architecture, Synthesis"));
        assert!(prompt.system.contains("modular_unit"));
    }

    #[test]
    fn builtin_request_with_plan_and_history() {
        let terrain = WaveTerrain::default();
        let plan = plan();
        let now = Utc::now();
        let objects = [WorldObject {
            id: WorldObjectId::new(),
            object_type: WorldObjectType::ModularUnit,
            position: Vec3::new(1.0, 0.0, 1.0),
            rotation: Vec3::ORIGIN,
            scale: Vec3::ONE,
            created_at: now,
        }];
        let logs = [LogEntry {
            id: LogEntryId::new(),
            kind: LogKind::Success,
            message: String::from("Synthesis Confirmed: Deploying modular_unit unit."),
            created_at: now,
        }];
        let context = OracleContext {
            recent_logs: &logs,
            objects: &objects,
            goal: "Solar ring",
            knowledge: &[],
            terrain: &terrain,
            active_plan: Some(&plan),
        };
        let prompt = PromptEngine::builtin()
            .unwrap()
            .render(&PromptInput::from_context(&context))
            .unwrap();

        assert!(prompt.user.contains("PLAN_ACTIVE: true"));
        assert!(prompt.user.contains("CURRENT_STEP: Lay first panel"));
        assert!(!prompt.user.contains("INITIATING NEW SEQUENCE"));
        assert!(prompt.user.contains("[modular_unit] at 1.0,0.0,1.0 (dist: 0.0m)"));
        assert!(prompt.user.contains("- [success] Synthesis Confirmed"));
    }

    #[test]
    fn directory_overrides_one_template() {
        let unique = format!(
            "architect_test_templates_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("system.j2"), "Custom oracle for {{ goal }}").ok();

        let engine = PromptEngine::new(Some(&dir)).unwrap();
        let prompt = engine.render(&PromptInput::for_goal("Dig a well", 2)).unwrap();
        assert_eq!(prompt.system, "Custom oracle for Dig a well");
        assert!(prompt.user.contains("KNOWLEDGE_COUNT: 2"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn broken_override_is_an_error() {
        let unique = format!(
            "architect_broken_templates_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("request.j2"), "{% if %}").ok();

        assert!(matches!(
            PromptEngine::new(Some(&dir)),
            Err(OracleError::Template(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
