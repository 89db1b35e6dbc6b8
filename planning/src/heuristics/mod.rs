//! Goal-distance estimates, built once per task and evaluated on demand
//! per state.

pub mod relaxed;

pub use relaxed::{HAdd, HMax};

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use crate::classical::{State, Task};
use crate::search::Cost;

/// A state evaluator. Implementations may memoize per state, keyed by the
/// state fingerprint; memos are never shared across tasks.
pub trait Heuristic {
    /// Estimated cost from `state` to the goal. `+∞` signals that the goal
    /// is unreachable from `state` even in the delete relaxation; callers
    /// that serialize the value substitute a finite sentinel.
    fn evaluate(&mut self, state: &State) -> Cost;
}

/// Number of unsatisfied goal atoms, `|goal \ s|`. Cheap and inadmissible.
pub struct GoalCount {
    task: Arc<Task>,
}

impl GoalCount {
    pub fn new(task: Arc<Task>) -> GoalCount {
        GoalCount { task }
    }
}

impl Heuristic for GoalCount {
    fn evaluate(&mut self, state: &State) -> Cost {
        self.task.goal.iter().filter(|goal| !state.contains(goal)).count() as Cost
    }
}

/// The available heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicKind {
    GoalCount,
    HAdd,
    HMax,
}

impl HeuristicKind {
    pub fn build(self, task: &Arc<Task>) -> Box<dyn Heuristic + Send> {
        match self {
            HeuristicKind::GoalCount => Box::new(GoalCount::new(task.clone())),
            HeuristicKind::HAdd => Box::new(HAdd::new(task.clone())),
            HeuristicKind::HMax => Box::new(HMax::new(task.clone())),
        }
    }
}

impl Display for HeuristicKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HeuristicKind::GoalCount => "goal_count",
            HeuristicKind::HAdd => "h_add",
            HeuristicKind::HMax => "h_max",
        };
        write!(f, "{name}")
    }
}

impl FromStr for HeuristicKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "goal_count" | "goal-count" => Ok(HeuristicKind::GoalCount),
            "h_add" | "h-add" | "hadd" => Ok(HeuristicKind::HAdd),
            "h_max" | "h-max" | "hmax" => Ok(HeuristicKind::HMax),
            _ => Err(format!("Unknown heuristic `{s}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classical::Atom;

    #[test]
    fn goal_count_counts_missing_atoms() {
        let task = Arc::new(crate::heuristics::relaxed::tests::chain_task());
        let mut h = GoalCount::new(task.clone());
        assert_eq!(h.evaluate(&task.init), 2.0);
        let goal_state: State = task.goal.iter().cloned().collect();
        assert_eq!(h.evaluate(&goal_state), 0.0);
        let partial = State::new([Atom::from("q")]);
        assert_eq!(h.evaluate(&partial), 1.0);
    }
}
