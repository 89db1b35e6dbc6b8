//! Plan validation by step-by-step simulation.

use std::sync::Arc;

use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::classical::{Atom, Op, State, Task};

/// One record of the execution trace. Step 0 holds the initial state and no
/// action; step `k > 0` holds the state after applying action `k` of the
/// plan. State snapshots are sorted, so traces compare stably.
#[derive(Clone, Debug, Serialize)]
pub struct TraceStep {
    pub step: usize,
    pub state: Vec<Atom>,
    pub action: Option<String>,
    pub applicable: Option<bool>,
}

/// Outcome of validating one candidate plan.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub error_step: Option<usize>,
    pub error_message: Option<String>,
    pub final_state: Option<Vec<Atom>>,
    pub execution_trace: Vec<TraceStep>,
}

impl ValidationResult {
    fn failure(step: usize, message: String, final_state: Option<&State>, trace: Vec<TraceStep>) -> ValidationResult {
        ValidationResult {
            valid: false,
            error_step: Some(step),
            error_message: Some(message),
            final_state: final_state.map(State::snapshot),
            execution_trace: trace,
        }
    }
}

/// Validates candidate plans against a grounded task by simulating them from
/// the initial state.
pub struct PlanValidator {
    task: Arc<Task>,
}

impl PlanValidator {
    pub fn new(task: Arc<Task>) -> PlanValidator {
        PlanValidator { task }
    }

    /// Simulates `plan` step by step. Fails on the first inapplicable action
    /// (with its step index), or after the last step when the goal is not
    /// satisfied (listing the missing atoms).
    pub fn validate(&self, plan: &[Op]) -> ValidationResult {
        let mut current = self.task.init.clone();
        let mut trace = vec![TraceStep {
            step: 0,
            state: current.snapshot(),
            action: None,
            applicable: None,
        }];

        for (step, &op) in plan.iter().enumerate() {
            let action = self.task.action(op);
            if !action.applicable(&current) {
                debug!(action = action.name.as_str(), step, "plan action not applicable");
                return ValidationResult::failure(
                    step,
                    format!("Action '{}' not applicable in step {step}", action.name),
                    Some(&current),
                    trace,
                );
            }
            current = action.apply(&current);
            trace.push(TraceStep {
                step: step + 1,
                state: current.snapshot(),
                action: Some(action.name.to_string()),
                applicable: Some(true),
            });
        }

        if !self.task.is_goal(&current) {
            let missing = self
                .task
                .goal
                .iter()
                .filter(|goal| !current.contains(goal))
                .join(", ");
            return ValidationResult::failure(
                plan.len(),
                format!("Goal not reached. Missing: {missing}"),
                Some(&current),
                trace,
            );
        }

        ValidationResult {
            valid: true,
            error_step: None,
            error_message: None,
            final_state: Some(current.snapshot()),
            execution_trace: trace,
        }
    }

    /// Validates a plan given as canonical action names. Each name is looked
    /// up exactly first; on a miss, the first grounded action whose name
    /// starts with the token before `(` is taken instead. A name that
    /// resolves to nothing fails at the step it would have occupied.
    pub fn validate_names<S: AsRef<str>>(&self, names: &[S]) -> ValidationResult {
        let mut plan = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            match self.resolve(name) {
                Some(op) => plan.push(op),
                None => {
                    return ValidationResult::failure(
                        plan.len(),
                        format!(
                            "Action '{name}' not applicable in step {}: no matching grounded action",
                            plan.len()
                        ),
                        None,
                        vec![],
                    )
                }
            }
        }
        self.validate(&plan)
    }

    /// Validates a plan in text form: one action per line, `;` comments
    /// stripped, blank lines skipped.
    pub fn validate_plan_text(&self, text: &str) -> ValidationResult {
        let names: Vec<&str> = text
            .lines()
            .map(|line| line.split(';').next().unwrap_or("").trim())
            .filter(|line| !line.is_empty())
            .collect();
        self.validate_names(&names)
    }

    fn resolve(&self, name: &str) -> Option<Op> {
        if let Some(op) = self.task.action_named(name) {
            return Some(op);
        }
        // lenient fallback: match on the schema token before `(`
        let prefix = name.split('(').next().unwrap_or(name);
        self.task
            .actions
            .iter()
            .position(|a| a.name.starts_with(prefix))
            .map(Op::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::relaxed::tests::chain_task;

    fn validator() -> PlanValidator {
        PlanValidator::new(Arc::new(chain_task()))
    }

    #[test]
    fn accepts_a_correct_plan() {
        let result = validator().validate_names(&["step1", "step2"]);
        assert!(result.valid);
        assert_eq!(result.error_step, None);
        let finals: Vec<String> = result.final_state.unwrap().iter().map(|a| a.to_string()).collect();
        assert_eq!(finals, vec!["p", "q", "r"]);
        assert_eq!(result.execution_trace.len(), 3);
        assert_eq!(result.execution_trace[0].action, None);
        assert_eq!(result.execution_trace[2].action.as_deref(), Some("step2"));
    }

    #[test]
    fn rejects_an_inapplicable_action() {
        let result = validator().validate_names(&["step2"]);
        assert!(!result.valid);
        assert_eq!(result.error_step, Some(0));
        let message = result.error_message.unwrap();
        assert!(message.contains("step2"));
        assert!(message.contains("not applicable"));
        // only the initial state made it into the trace
        assert_eq!(result.execution_trace.len(), 1);
    }

    #[test]
    fn rejects_when_the_goal_is_unmet() {
        let result = validator().validate_names(&["step1"]);
        assert!(!result.valid);
        assert_eq!(result.error_step, Some(1));
        assert!(result.error_message.unwrap().contains('r'));
        assert_eq!(result.execution_trace.len(), 2);
    }

    #[test]
    fn unknown_names_fail_at_their_step() {
        let result = validator().validate_names(&["step1", "warp(a,b)"]);
        assert!(!result.valid);
        assert_eq!(result.error_step, Some(1));
        assert!(result.error_message.unwrap().contains("warp(a,b)"));
    }

    #[test]
    fn schema_prefix_fallback() {
        // `step1()` misses the exact lookup but prefix-matches `step1`
        let result = validator().validate_names(&["step1(", "step2"]);
        assert!(result.valid);
    }

    #[test]
    fn plan_text_with_comments() {
        let result = validator().validate_plan_text("step1 ; first\n\n; nothing here\nstep2\n");
        assert!(result.valid);
    }

    #[test]
    fn trace_replay_reaches_the_final_state() {
        let task = Arc::new(chain_task());
        let validator = PlanValidator::new(task.clone());
        let result = validator.validate_names(&["step1", "step2"]);
        let mut state = task.init.clone();
        for step in &result.execution_trace[1..] {
            let op = task.action_named(step.action.as_deref().unwrap()).unwrap();
            state = task.action(op).apply(&state);
            assert_eq!(state.snapshot(), step.state);
        }
        assert_eq!(state.snapshot(), result.final_state.clone().unwrap());
    }
}
