use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use compact_str::CompactString;
use im::OrdSet;

use crate::classical::action::Action;
use crate::classical::state::{Atom, State};

/// Unique numeric identifier of a grounded action within its [`Task`].
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Op(usize);

impl From<Op> for usize {
    fn from(op: Op) -> Self {
        op.0
    }
}

impl From<usize> for Op {
    fn from(x: usize) -> Self {
        Op(x)
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "op{}", self.0)
    }
}

/// A fully grounded planning task.
///
/// Built once by the grounder and read-only afterwards: search, heuristics
/// and validation all borrow it without mutating it. The action list order is
/// stable and fixes successor-generation order downstream.
#[derive(Clone, Debug)]
pub struct Task {
    pub name: CompactString,
    pub domain: CompactString,
    pub objects: BTreeMap<CompactString, CompactString>,
    pub init: State,
    pub goal: OrdSet<Atom>,
    pub actions: Vec<Action>,
}

impl Task {
    pub fn action(&self, op: Op) -> &Action {
        &self.actions[op.0]
    }

    pub fn ops(&self) -> impl Iterator<Item = Op> {
        (0..self.actions.len()).map(Op)
    }

    /// Actions applicable in `state`, in action-list order.
    pub fn applicable(&self, state: &State) -> Vec<Op> {
        self.actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.applicable(state))
            .map(|(i, _)| Op(i))
            .collect()
    }

    pub fn is_goal(&self, state: &State) -> bool {
        state.satisfies(&self.goal)
    }

    /// Looks an action up by its canonical grounded name.
    pub fn action_named(&self, name: &str) -> Option<Op> {
        self.actions.iter().position(|a| a.name == name).map(Op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classical::action::ActionSchema;
    use crate::classical::Literal;

    fn tiny_task() -> Task {
        let toggle = ActionSchema {
            name: "toggle".into(),
            parameters: vec![],
            preconditions: vec![Literal::new("off", vec![])],
            add_effects: vec![Literal::new("on", vec![])],
            del_effects: vec![Literal::new("off", vec![])],
        };
        Task {
            name: "tiny".into(),
            domain: "switch".into(),
            objects: BTreeMap::new(),
            init: State::new([Atom::from("off")]),
            goal: [Atom::from("on")].into_iter().collect(),
            actions: vec![toggle.ground::<&str>(&[]).unwrap()],
        }
    }

    #[test]
    fn applicability_scan() {
        let task = tiny_task();
        assert_eq!(task.applicable(&task.init), vec![Op(0)]);
        let on = task.action(Op(0)).apply(&task.init);
        assert!(task.applicable(&on).is_empty());
        assert!(task.is_goal(&on));
        assert!(!task.is_goal(&task.init));
    }

    #[test]
    fn lookup_by_name() {
        let task = tiny_task();
        assert_eq!(task.action_named("toggle"), Some(Op(0)));
        assert_eq!(task.action_named("missing"), None);
    }
}
