use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::classical::{State, Task};
use crate::search::{SearchAlgorithm, SearchResult, SearchSpace};

/// Breadth-first search with a FIFO frontier.
///
/// The goal test runs at generation time, so the search returns as soon as
/// any generated node satisfies the goal; with unit costs the plan is
/// optimal.
pub struct Bfs {
    task: Arc<Task>,
    timeout: Duration,
}

impl Bfs {
    pub fn new(task: Arc<Task>, timeout: Duration) -> Bfs {
        Bfs { task, timeout }
    }
}

impl SearchAlgorithm for Bfs {
    fn search(&mut self) -> SearchResult {
        let mut space = SearchSpace::new(self.task.clone(), self.timeout);
        let init = self.task.init.clone();
        if self.task.is_goal(&init) {
            return SearchSpace::solved_trivially();
        }

        // `visited` holds every state ever enqueued, the initial one included
        let mut visited: HashSet<State> = HashSet::from([init.clone()]);
        let root = space.create_node(init, None, None, 0, 0.0);
        let mut frontier = VecDeque::from([root]);

        while let Some(id) = frontier.pop_front() {
            if space.timed_out() {
                return space.timeout_result(0.0);
            }
            space.mark_expanded(id);
            let state = space.node(id).state.clone();
            let g = space.node(id).g;

            for op in self.task.applicable(&state) {
                let successor = self.task.action(op).apply(&state);
                space.count_generated();
                if visited.contains(&successor) {
                    continue;
                }
                visited.insert(successor.clone());
                let child = space.create_node(successor.clone(), Some(op), Some(id), g + 1, 0.0);
                if self.task.is_goal(&successor) {
                    return space.solved(child, 0.0);
                }
                frontier.push_back(child);
            }
        }
        space.exhausted(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::relaxed::tests::chain_task;

    #[test]
    fn finds_the_shortest_chain_plan() {
        let task = Arc::new(chain_task());
        let result = Bfs::new(task.clone(), Duration::from_secs(5)).search();
        assert!(result.success);
        assert_eq!(result.plan_names(&task), vec!["step1", "step2"]);
        assert_eq!(result.plan_length, 2);
        assert!(result.nodes_expanded >= 1);
        assert!(result.nodes_generated >= 2);
    }

    #[test]
    fn records_edges_with_action_labels() {
        let task = Arc::new(chain_task());
        let result = Bfs::new(task.clone(), Duration::from_secs(5)).search();
        assert_eq!(result.tree.nodes.len(), 3);
        assert_eq!(result.tree.edges.len(), 2);
        assert_eq!(result.tree.nodes[0].id, "n1");
        assert_eq!(result.tree.edges[0].source, "n1");
        assert_eq!(result.tree.edges[0].action, "step1");
        // the goal node was generated, never expanded
        let goal = result.tree.nodes.iter().find(|n| n.is_goal).unwrap();
        assert!(!goal.is_expanded);
    }
}
