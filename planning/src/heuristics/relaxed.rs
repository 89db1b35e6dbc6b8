//! Delete-relaxation heuristics: h-add and h-max.
//!
//! Both share one forward-propagation fixed point over the relaxed problem
//! (delete effects dropped) and differ only in how goal costs are combined.

use std::collections::HashMap;
use std::sync::Arc;

use crate::classical::{Atom, State, Task};
use crate::heuristics::Heuristic;
use crate::search::Cost;

/// Safety net on fixed-point rounds; natural termination occurs at the
/// propositional fixed point long before.
const MAX_ROUNDS: usize = 1000;

/// Cheapest relaxed achievement cost of every atom reachable from `state`.
///
/// Atoms of `state` cost 0. An action whose preconditions all have finite
/// cost costs one more than its most expensive precondition (an action
/// without preconditions costs 1) and propagates that cost to its add
/// effects. Atoms absent from the returned map are unreachable even in the
/// relaxation.
pub(crate) fn relaxed_costs(task: &Task, state: &State) -> HashMap<Atom, Cost> {
    let mut costs: HashMap<Atom, Cost> = state.iter().map(|atom| (atom.clone(), 0.0)).collect();

    for _ in 0..MAX_ROUNDS {
        let mut changed = false;
        for action in &task.actions {
            let mut worst: Cost = 0.0;
            let mut reachable = true;
            for pre in &action.preconditions {
                match costs.get(pre) {
                    Some(&c) => worst = worst.max(c),
                    None => {
                        reachable = false;
                        break;
                    }
                }
            }
            if !reachable {
                continue;
            }
            let action_cost = 1.0 + worst;
            for add in &action.add_effects {
                if costs.get(add).map_or(true, |&old| action_cost < old) {
                    costs.insert(add.clone(), action_cost);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    costs
}

/// Additive delete-relaxation heuristic: the sum of relaxed goal costs.
/// Informative but inadmissible when subgoals share structure.
pub struct HAdd {
    task: Arc<Task>,
    memo: HashMap<u64, Cost>,
}

impl HAdd {
    pub fn new(task: Arc<Task>) -> HAdd {
        HAdd {
            task,
            memo: HashMap::new(),
        }
    }
}

impl Heuristic for HAdd {
    fn evaluate(&mut self, state: &State) -> Cost {
        let key = state.fingerprint();
        if let Some(&h) = self.memo.get(&key) {
            return h;
        }
        let costs = relaxed_costs(&self.task, state);
        let mut total: Cost = 0.0;
        for goal in self.task.goal.iter() {
            match costs.get(goal) {
                Some(c) => total += c,
                None => {
                    total = Cost::INFINITY;
                    break;
                }
            }
        }
        self.memo.insert(key, total);
        total
    }
}

/// Max delete-relaxation heuristic: the most expensive relaxed goal cost.
/// Admissible and consistent under unit costs.
pub struct HMax {
    task: Arc<Task>,
    memo: HashMap<u64, Cost>,
}

impl HMax {
    pub fn new(task: Arc<Task>) -> HMax {
        HMax {
            task,
            memo: HashMap::new(),
        }
    }
}

impl Heuristic for HMax {
    fn evaluate(&mut self, state: &State) -> Cost {
        let key = state.fingerprint();
        if let Some(&h) = self.memo.get(&key) {
            return h;
        }
        let costs = relaxed_costs(&self.task, state);
        let mut worst: Cost = 0.0;
        for goal in self.task.goal.iter() {
            match costs.get(goal) {
                Some(&c) => worst = worst.max(c),
                None => {
                    worst = Cost::INFINITY;
                    break;
                }
            }
        }
        self.memo.insert(key, worst);
        worst
    }
}
