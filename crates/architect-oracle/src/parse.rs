//! LLM response parsing into a normalized [`Decision`].
//!
//! The model returns raw text, ideally a JSON object. Extraction tries, in
//! order: the text as-is, the body of a markdown code fence, each of those
//! with trailing commas removed, and finally the outermost `{...}` span.
//! Text that yields no JSON object becomes [`fallback_decision`].
//!
//! A JSON object is never rejected outright. Each field is repaired on its
//! own: unknown or missing values take documented defaults so the
//! orchestrator always receives a well-formed decision.

use std::collections::HashSet;

use architect_core::{fallback_decision, plan};
use architect_types::{
    ActionKind, ConstructionPlan, Decision, DecisionAction, GroundingLink, KnowledgeCategory,
    PlanId, PlanStep, StepStatus, Vec3, WorldObjectType,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::OracleError;

/// Title given to grounding links that arrive without one.
pub const DEFAULT_LINK_TITLE: &str = "Underworld Archive";

/// Reason used when the model gives none.
pub const DEFAULT_REASON: &str = "No rationale provided.";

/// Task label used when the model gives none.
pub const DEFAULT_TASK_LABEL: &str = "Processing directive";

/// Learning note used when the model gives none.
pub const DEFAULT_LEARNING_NOTE: &str = "Synthesis Logic: no annotation returned.";

/// Objective given to a proposed plan that lacks one.
pub const DEFAULT_OBJECTIVE: &str = "Strategic Synthesis";

/// Most reasoning lines kept from one response.
pub const MAX_REASONING_STEPS: usize = 5;

/// Fewest reasoning lines a decision carries; short lists are padded.
pub const MIN_REASONING_STEPS: usize = 3;

const PLACEHOLDER_STEPS: [&str; MIN_REASONING_STEPS] = [
    "Directive received",
    "Evaluating sector constraints",
    "Committing synthesis command",
];

/// Parse a response into a decision, merging in backend grounding.
///
/// Never fails: unparsable text is logged and replaced by the fallback.
pub fn parse_decision(raw: &str, grounding: Vec<GroundingLink>) -> Decision {
    let parsed = extract_json(raw).and_then(|value| match value {
        Value::Object(object) => Ok(object),
        other => Err(OracleError::Parse(format!(
            "expected a JSON object, got {other}"
        ))),
    });
    match parsed {
        Ok(object) => repair(&object, grounding),
        Err(e) => {
            warn!(
                error = %e,
                raw_response = raw,
                "failed to parse oracle response, substituting fallback"
            );
            fallback_decision()
        }
    }
}

/// Pull the first JSON value out of `raw` using the recovery strategies.
pub fn extract_json(raw: &str) -> Result<Value, OracleError> {
    let trimmed = raw.trim();

    let mut candidates: Vec<String> = vec![trimmed.to_owned()];
    if let Some(fenced) = extract_json_from_codeblock(trimmed) {
        candidates.push(fenced.to_owned());
    }
    let repaired: Vec<String> = candidates.iter().map(|c| strip_trailing_commas(c)).collect();
    candidates.extend(repaired);
    if let Some(span) = outer_brace_span(trimmed) {
        candidates.push(strip_trailing_commas(span));
    }

    candidates
        .iter()
        .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .ok_or_else(|| OracleError::Parse(format!("all parse strategies failed for: {trimmed}")))
}

/// Repair a parsed JSON object into a decision.
pub fn repair(object: &Map<String, Value>, grounding: Vec<GroundingLink>) -> Decision {
    let kind = str_field(object, "action")
        .and_then(ActionKind::from_label)
        .unwrap_or(ActionKind::Wait);
    let position = object.get("position").and_then(parse_position);
    let action = match kind {
        ActionKind::Place => DecisionAction::Place {
            object_type: str_field(object, "objectType")
                .or_else(|| str_field(object, "type"))
                .and_then(WorldObjectType::from_label),
            position,
        },
        ActionKind::Move => DecisionAction::Move { position },
        ActionKind::Wait => DecisionAction::Wait,
    };

    let mut reasoning_steps: Vec<String> = object
        .get("reasoningSteps")
        .and_then(Value::as_array)
        .map(|steps| {
            steps
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .take(MAX_REASONING_STEPS)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();
    let given = reasoning_steps.len();
    reasoning_steps.extend(PLACEHOLDER_STEPS.iter().skip(given).map(|s| (*s).to_owned()));

    let plan = object.get("plan").and_then(parse_plan);
    debug!(
        action = ?kind,
        reasoning_steps = reasoning_steps.len(),
        proposes_plan = plan.is_some(),
        "Oracle response repaired"
    );

    Decision {
        action,
        reason: str_field(object, "reason")
            .unwrap_or(DEFAULT_REASON)
            .to_owned(),
        reasoning_steps,
        learning_note: str_field(object, "learningNote")
            .unwrap_or(DEFAULT_LEARNING_NOTE)
            .to_owned(),
        knowledge_category: str_field(object, "knowledgeCategory")
            .and_then(KnowledgeCategory::from_label)
            .unwrap_or_default(),
        task_label: str_field(object, "taskLabel")
            .unwrap_or(DEFAULT_TASK_LABEL)
            .to_owned(),
        plan,
        grounding_links: merge_links(object.get("groundingLinks"), grounding),
    }
}

/// Build a link from loose parts. Blank URIs are dropped; blank titles
/// become [`DEFAULT_LINK_TITLE`].
pub fn link_from_parts(uri: Option<&str>, title: Option<&str>) -> Option<GroundingLink> {
    let uri = uri.map(str::trim).filter(|u| !u.is_empty())?;
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_LINK_TITLE);
    Some(GroundingLink {
        uri: uri.to_owned(),
        title: title.to_owned(),
    })
}

fn str_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// At least three finite numbers; extra elements are ignored.
fn parse_position(value: &Value) -> Option<Vec3> {
    let coords = value.as_array()?;
    let mut numbers = coords.iter().map(Value::as_f64);
    let position = Vec3::new(numbers.next()??, numbers.next()??, numbers.next()??);
    position.is_finite().then_some(position)
}

fn parse_step(value: &Value) -> Option<PlanStep> {
    let step = value.as_object()?;
    Some(PlanStep {
        label: str_field(step, "label")?.to_owned(),
        object_type: str_field(step, "type")
            .or_else(|| str_field(step, "objectType"))
            .and_then(WorldObjectType::from_label)?,
        position: step.get("position").and_then(parse_position)?,
        status: StepStatus::Pending,
    })
}

/// Keep the well-formed steps and normalize the plan so its first step is
/// active. A plan with no usable steps is discarded.
fn parse_plan(value: &Value) -> Option<ConstructionPlan> {
    let proposal = value.as_object()?;
    let steps: Vec<PlanStep> = proposal
        .get("steps")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(parse_step)
        .collect();
    plan::prepare_proposal(ConstructionPlan {
        id: PlanId::new(),
        objective: str_field(proposal, "objective")
            .unwrap_or(DEFAULT_OBJECTIVE)
            .to_owned(),
        steps,
        current_step_index: 0,
        source_blueprint: str_field(proposal, "sourceBlueprint").map(ToOwned::to_owned),
    })
}

/// Payload links first, then backend grounding, without duplicate URIs.
fn merge_links(payload: Option<&Value>, grounding: Vec<GroundingLink>) -> Vec<GroundingLink> {
    let from_payload = payload
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|link| {
            link_from_parts(
                link.get("uri").and_then(Value::as_str),
                link.get("title").and_then(Value::as_str),
            )
        });
    let mut seen = HashSet::new();
    from_payload
        .chain(grounding)
        .filter(|link| seen.insert(link.uri.clone()))
        .collect()
}

/// Extract the body of the first markdown code fence.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = text.get(open..)?.get(3..)?;
    // An info string such as `json` runs to the end of the fence line.
    let body_start = match after_fence.find('\n') {
        Some(newline) if !after_fence.get(..newline)?.contains("```") => newline.saturating_add(1),
        _ => 0,
    };
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// The span from the first `{` to the last `}`.
fn outer_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Remove commas that directly precede a closing brace or bracket, leaving
/// string contents alone.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let rest = text.get(index..).and_then(|s| s.get(1..)).unwrap_or_default();
            if matches!(rest.trim_start().chars().next(), Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Decision {
        parse_decision(raw, Vec::new())
    }

    #[test]
    fn parse_complete_place() {
        let raw = r#"{
            "action": "PLACE",
            "objectType": "solar_panel",
            "position": [4, 9.5, -2],
            "reason": "Energy deficit near the core",
            "reasoningSteps": ["Scanning roof clearance", "Checking sun exposure", "Snapping to elevation"],
            "learningNote": "Solar Orientation: south-facing arrays gain 20%",
            "knowledgeCategory": "Energy",
            "taskLabel": "Deploying array"
        }"#;
        let decision = parse(raw);
        assert_eq!(
            decision.action,
            DecisionAction::Place {
                object_type: Some(WorldObjectType::SolarPanel),
                position: Some(Vec3::new(4.0, 9.5, -2.0)),
            }
        );
        assert_eq!(decision.reason, "Energy deficit near the core");
        assert_eq!(decision.reasoning_steps.len(), 3);
        assert_eq!(decision.knowledge_category, KnowledgeCategory::Energy);
        assert_eq!(decision.task_label, "Deploying array");
        assert!(decision.plan.is_none());
    }

    #[test]
    fn parse_from_codeblock() {
        let raw = "Here is the command:\n\n```json\n{\"action\": \"move\", \"position\": [1, 0, 1]}\n```\nEnd.";
        let decision = parse(raw);
        assert_eq!(
            decision.action,
            DecisionAction::Move {
                position: Some(Vec3::new(1.0, 0.0, 1.0))
            }
        );
    }

    #[test]
    fn parse_trailing_comma_and_prose() {
        let raw = r#"Sure! {"action": "WAIT", "reason": "Holding, for now",}"#;
        let decision = parse(raw);
        assert_eq!(decision.action, DecisionAction::Wait);
        assert_eq!(decision.reason, "Holding, for now");
    }

    #[test]
    fn garbage_and_empty_become_fallback() {
        assert_eq!(parse("I think I will build a wall."), fallback_decision());
        assert_eq!(parse(""), fallback_decision());
        assert_eq!(parse("[1, 2, 3]"), fallback_decision());
    }

    #[test]
    fn empty_object_takes_every_default() {
        let decision = parse("{}");
        assert_eq!(decision.action, DecisionAction::Wait);
        assert_eq!(decision.reason, DEFAULT_REASON);
        assert_eq!(decision.task_label, DEFAULT_TASK_LABEL);
        assert_eq!(decision.learning_note, DEFAULT_LEARNING_NOTE);
        assert_eq!(decision.knowledge_category, KnowledgeCategory::Synthesis);
        assert_eq!(decision.reasoning_steps, PLACEHOLDER_STEPS.map(String::from).to_vec());
    }

    #[test]
    fn short_reasoning_is_padded_to_three_lines() {
        let decision = parse(r#"{"action": "WAIT", "reasoningSteps": ["Holding position", "  "]}"#);
        assert_eq!(
            decision.reasoning_steps,
            vec![
                String::from("Holding position"),
                String::from("Evaluating sector constraints"),
                String::from("Committing synthesis command"),
            ]
        );

        let decision = parse(r#"{"reasoningSteps": ["One", "Two"]}"#);
        assert_eq!(decision.reasoning_steps.len(), MIN_REASONING_STEPS);
        assert_eq!(decision.reasoning_steps.first().unwrap(), "One");
    }

    #[test]
    fn unknown_values_are_dropped() {
        let raw = r#"{
            "action": "TELEPORT",
            "knowledgeCategory": "Alchemy"
        }"#;
        let decision = parse(raw);
        assert_eq!(decision.action, DecisionAction::Wait);
        assert_eq!(decision.knowledge_category, KnowledgeCategory::Synthesis);

        let decision = parse(r#"{"action": "PLACE", "objectType": "castle", "position": [1, "x", 2]}"#);
        assert_eq!(
            decision.action,
            DecisionAction::Place {
                object_type: None,
                position: None
            }
        );
    }

    #[test]
    fn position_keeps_first_three_coordinates() {
        let decision = parse(r#"{"action": "MOVE", "position": [1, 2, 3, 4]}"#);
        assert_eq!(
            decision.action,
            DecisionAction::Move {
                position: Some(Vec3::new(1.0, 2.0, 3.0))
            }
        );
        let decision = parse(r#"{"action": "MOVE", "position": [1, 2]}"#);
        assert_eq!(decision.action, DecisionAction::Move { position: None });
    }

    #[test]
    fn reasoning_is_trimmed_and_capped() {
        let raw = r#"{"reasoningSteps": ["a", " ", "b", "c", "d", "e", "f", 7]}"#;
        let decision = parse(raw);
        assert_eq!(decision.reasoning_steps, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn plan_is_filtered_and_normalized() {
        let raw = r#"{
            "action": "PLACE",
            "plan": {
                "steps": [
                    {"label": "Core", "type": "modular_unit", "position": [0, 0, 0], "status": "completed"},
                    {"label": "Broken", "type": "spaceship", "position": [1, 0, 1], "status": "pending"},
                    {"label": "Power", "type": "Solar Panel", "position": [3, 0, 0], "status": "active"},
                    {"label": "", "type": "well", "position": [5, 0, 5], "status": "pending"}
                ],
                "currentStepIndex": 3
            }
        }"#;
        let plan = parse(raw).plan.unwrap();
        assert_eq!(plan.objective, DEFAULT_OBJECTIVE);
        assert_eq!(plan.current_step_index, 0);
        let summary: Vec<_> = plan
            .steps
            .iter()
            .map(|s| (s.label.as_str(), s.object_type, s.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Core", WorldObjectType::ModularUnit, StepStatus::Active),
                ("Power", WorldObjectType::SolarPanel, StepStatus::Pending),
            ]
        );
        assert!(plan::validate(&plan).is_ok());
    }

    #[test]
    fn plan_without_usable_steps_is_discarded() {
        let raw = r#"{"plan": {"objective": "Nothing", "steps": [{"label": "x"}]}}"#;
        assert!(parse(raw).plan.is_none());
        assert!(parse(r#"{"plan": {"objective": "Nothing"}}"#).plan.is_none());
    }

    #[test]
    fn links_merge_without_duplicates() {
        let raw = r#"{"groundingLinks": [
            {"uri": "https://example.org/a", "title": "A"},
            {"uri": "  ", "title": "blank"},
            {"uri": "https://example.org/b"}
        ]}"#;
        let grounding = vec![
            GroundingLink {
                uri: String::from("https://example.org/a"),
                title: String::from("A again"),
            },
            GroundingLink {
                uri: String::from("https://example.org/c"),
                title: String::from("C"),
            },
        ];
        let links = parse_decision(raw, grounding).grounding_links;
        let uris: Vec<_> = links.iter().map(|l| l.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec![
                "https://example.org/a",
                "https://example.org/b",
                "https://example.org/c"
            ]
        );
        assert_eq!(links.get(1).unwrap().title, DEFAULT_LINK_TITLE);
    }

    #[test]
    fn extract_json_from_markdown() {
        assert_eq!(
            extract_json_from_codeblock("```json\n{\"key\": \"value\"}\n```"),
            Some("{\"key\": \"value\"}")
        );
        assert_eq!(
            extract_json_from_codeblock("```\n{\"key\": \"value\"}\n```"),
            Some("{\"key\": \"value\"}")
        );
        assert_eq!(
            extract_json_from_codeblock("```{\"key\": 1}```"),
            Some("{\"key\": 1}")
        );
    }

    #[test]
    fn strip_trailing_commas_respects_strings() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1, "b": 2,}"#), r#"{"a": 1, "b": 2}"#);
        assert_eq!(strip_trailing_commas("[1, 2, 3,\n]"), "[1, 2, 3\n]");
        assert_eq!(strip_trailing_commas(r#"{"a": ",}"}"#), r#"{"a": ",}"}"#);
        assert_eq!(strip_trailing_commas(r#"{"a": "\",}"}"#), r#"{"a": "\",}"}"#);
    }
}
