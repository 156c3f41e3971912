//! Construction plan state machine.
//!
//! A plan moves through its steps strictly in order, one placement per
//! step. The functions here never mutate a plan in place: they consume the
//! current value and return the next one, so a failed tick can simply drop
//! the result.
//!
//! Transitions on a placement:
//!
//! - a newly proposed plan replaces whatever was active, progress and all;
//! - otherwise the active step completes and the next one activates;
//! - completing the last step destroys the plan.
//!
//! Relocation and standby never touch the plan.

use architect_types::{ActionKind, ConstructionPlan, StepStatus};

/// The plan invariant does not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The plan has no steps.
    #[error("plan has no steps")]
    Empty,

    /// `current_step_index` is past the end of the step list.
    #[error("current step index {index} out of range for {len} steps")]
    IndexOutOfRange {
        /// The stored index.
        index: usize,
        /// Number of steps.
        len: usize,
    },

    /// A step has the wrong status for its position relative to the index.
    #[error("step {step} is {found:?}, expected {expected:?}")]
    StatusMismatch {
        /// Offending step.
        step: usize,
        /// Status the invariant requires.
        expected: StepStatus,
        /// Status actually stored.
        found: StepStatus,
    },
}

/// What happened to the plan during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTransition {
    /// No plan change.
    Unchanged,
    /// A new plan was adopted. Any previous plan was discarded.
    Adopted {
        /// Steps in the new plan.
        steps: usize,
    },
    /// The active step completed and the next one activated.
    Advanced {
        /// Newly active step.
        active: usize,
    },
    /// The last step completed and the plan was destroyed.
    Completed,
}

/// Check the plan invariant: steps before the index are completed, the step
/// at the index is active, and steps after it are pending.
pub fn validate(plan: &ConstructionPlan) -> Result<(), PlanError> {
    let len = plan.steps.len();
    if len == 0 {
        return Err(PlanError::Empty);
    }
    let index = plan.current_step_index;
    if index >= len {
        return Err(PlanError::IndexOutOfRange { index, len });
    }
    for (step, entry) in plan.steps.iter().enumerate() {
        let expected = match step.cmp(&index) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal => StepStatus::Active,
            std::cmp::Ordering::Greater => StepStatus::Pending,
        };
        if entry.status != expected {
            return Err(PlanError::StatusMismatch {
                step,
                expected,
                found: entry.status,
            });
        }
    }
    Ok(())
}

/// Normalize a freshly proposed plan: index 0, step 0 active, all other
/// steps pending. Returns `None` for a plan with no steps.
pub fn prepare_proposal(mut plan: ConstructionPlan) -> Option<ConstructionPlan> {
    if plan.steps.is_empty() {
        return None;
    }
    plan.current_step_index = 0;
    for (index, step) in plan.steps.iter_mut().enumerate() {
        step.status = if index == 0 {
            StepStatus::Active
        } else {
            StepStatus::Pending
        };
    }
    Some(plan)
}

/// Compute the plan after a tick.
///
/// `proposed` is the plan carried by the decision, if any. It wins over any
/// implicit advance of `current`.
pub fn transition(
    current: Option<ConstructionPlan>,
    proposed: Option<ConstructionPlan>,
    action: ActionKind,
) -> Result<(Option<ConstructionPlan>, PlanTransition), PlanError> {
    if action != ActionKind::Place {
        return Ok((current, PlanTransition::Unchanged));
    }
    if let Some(plan) = proposed {
        validate(&plan)?;
        let steps = plan.steps.len();
        return Ok((Some(plan), PlanTransition::Adopted { steps }));
    }
    match current {
        Some(plan) => advance(plan),
        None => Ok((None, PlanTransition::Unchanged)),
    }
}

/// Complete the active step and activate the next, or destroy the plan when
/// the last step completes.
pub fn advance(
    mut plan: ConstructionPlan,
) -> Result<(Option<ConstructionPlan>, PlanTransition), PlanError> {
    validate(&plan)?;
    let index = plan.current_step_index;
    if let Some(step) = plan.steps.get_mut(index) {
        step.status = StepStatus::Completed;
    }
    let next = index.saturating_add(1);
    match plan.steps.get_mut(next) {
        Some(step) => {
            step.status = StepStatus::Active;
            plan.current_step_index = next;
            Ok((Some(plan), PlanTransition::Advanced { active: next }))
        }
        None => Ok((None, PlanTransition::Completed)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use architect_types::{PlanId, PlanStep, Vec3, WorldObjectType};

    use super::*;

    fn step(label: &str, status: StepStatus) -> PlanStep {
        PlanStep {
            label: label.to_owned(),
            object_type: WorldObjectType::ModularUnit,
            position: Vec3::new(2.0, 0.0, 5.0),
            status,
        }
    }

    fn three_step_plan() -> ConstructionPlan {
        ConstructionPlan {
            id: PlanId::new(),
            objective: String::from("Anchor the settlement"),
            steps: vec![
                step("Foundation", StepStatus::Active),
                step("Power", StepStatus::Pending),
                step("Water", StepStatus::Pending),
            ],
            current_step_index: 0,
            source_blueprint: None,
        }
    }

    fn active_count(plan: &ConstructionPlan) -> usize {
        plan.steps
            .iter()
            .filter(|s| s.status == StepStatus::Active)
            .count()
    }

    #[test]
    fn three_placements_walk_the_plan_to_completion() {
        let plan = three_step_plan();

        let (plan, t) = transition(Some(plan), None, ActionKind::Place).unwrap();
        assert_eq!(t, PlanTransition::Advanced { active: 1 });
        let plan = plan.unwrap();
        assert_eq!(plan.steps.first().unwrap().status, StepStatus::Completed);
        assert_eq!(plan.current_step().unwrap().label, "Power");
        assert_eq!(active_count(&plan), 1);

        let (plan, t) = transition(Some(plan), None, ActionKind::Place).unwrap();
        assert_eq!(t, PlanTransition::Advanced { active: 2 });
        let plan = plan.unwrap();
        assert_eq!(active_count(&plan), 1);
        validate(&plan).unwrap();

        let (plan, t) = transition(Some(plan), None, ActionKind::Place).unwrap();
        assert_eq!(t, PlanTransition::Completed);
        assert!(plan.is_none());
    }

    #[test]
    fn move_and_wait_leave_plan_untouched() {
        let plan = three_step_plan();
        for action in [ActionKind::Move, ActionKind::Wait] {
            let (next, t) = transition(Some(plan.clone()), None, action).unwrap();
            assert_eq!(t, PlanTransition::Unchanged);
            assert_eq!(next.as_ref(), Some(&plan));
        }
    }

    #[test]
    fn proposal_on_wait_is_ignored() {
        let proposal = prepare_proposal(three_step_plan()).unwrap();
        let (next, t) = transition(None, Some(proposal), ActionKind::Wait).unwrap();
        assert_eq!(t, PlanTransition::Unchanged);
        assert!(next.is_none());
    }

    #[test]
    fn new_plan_discards_previous_progress() {
        let (current, _) = advance(three_step_plan()).unwrap();
        let proposal = prepare_proposal(three_step_plan()).unwrap();
        let proposal_id = proposal.id;

        let (next, t) = transition(current, Some(proposal), ActionKind::Place).unwrap();
        assert_eq!(t, PlanTransition::Adopted { steps: 3 });
        let next = next.unwrap();
        assert_eq!(next.id, proposal_id);
        assert_eq!(next.current_step_index, 0);
        assert_eq!(next.steps.first().unwrap().status, StepStatus::Active);
    }

    #[test]
    fn place_without_any_plan_is_a_no_op() {
        let (next, t) = transition(None, None, ActionKind::Place).unwrap();
        assert!(next.is_none());
        assert_eq!(t, PlanTransition::Unchanged);
    }

    #[test]
    fn prepare_proposal_repairs_statuses_and_index() {
        let mut raw = three_step_plan();
        raw.current_step_index = 2;
        for s in &mut raw.steps {
            s.status = StepStatus::Completed;
        }
        let repaired = prepare_proposal(raw).unwrap();
        assert_eq!(repaired.current_step_index, 0);
        validate(&repaired).unwrap();

        let mut empty = three_step_plan();
        empty.steps.clear();
        assert!(prepare_proposal(empty).is_none());
    }

    #[test]
    fn invariant_violations_are_reported_not_repaired() {
        let mut plan = three_step_plan();
        plan.steps.get_mut(0).unwrap().status = StepStatus::Pending;
        assert_eq!(
            advance(plan).unwrap_err(),
            PlanError::StatusMismatch {
                step: 0,
                expected: StepStatus::Active,
                found: StepStatus::Pending,
            }
        );

        let mut plan = three_step_plan();
        plan.current_step_index = 7;
        assert!(matches!(
            validate(&plan),
            Err(PlanError::IndexOutOfRange { index: 7, len: 3 })
        ));
    }

    #[test]
    fn single_step_plan_completes_on_first_placement() {
        let mut plan = three_step_plan();
        plan.steps.truncate(1);
        let (next, t) = advance(plan).unwrap();
        assert!(next.is_none());
        assert_eq!(t, PlanTransition::Completed);
    }
}
