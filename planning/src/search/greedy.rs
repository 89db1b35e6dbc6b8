use std::sync::Arc;
use std::time::Duration;

use crate::classical::Task;
use crate::heuristics::Heuristic;
use crate::search::astar::{best_first, QueueKey};
use crate::search::{SearchAlgorithm, SearchResult};

/// Greedy best-first search: the frontier is keyed by `h` alone and g-costs
/// are tracked only for plan length. Usually the fastest way to any plan,
/// with no optimality guarantee. Duplicate detection is the same as in A*.
pub struct Greedy {
    task: Arc<Task>,
    timeout: Duration,
    heuristic: Box<dyn Heuristic + Send>,
}

impl Greedy {
    pub fn new(task: Arc<Task>, timeout: Duration, heuristic: Box<dyn Heuristic + Send>) -> Greedy {
        Greedy {
            task,
            timeout,
            heuristic,
        }
    }
}

impl SearchAlgorithm for Greedy {
    fn search(&mut self) -> SearchResult {
        best_first(self.task.clone(), self.timeout, self.heuristic.as_mut(), QueueKey::HCost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::relaxed::tests::chain_task;
    use crate::heuristics::HAdd;

    #[test]
    fn reaches_the_goal() {
        let task = Arc::new(chain_task());
        let mut search = Greedy::new(
            task.clone(),
            Duration::from_secs(5),
            Box::new(HAdd::new(task.clone())),
        );
        let result = search.search();
        assert!(result.success);
        assert_eq!(result.plan_names(&task), vec!["step1", "step2"]);
        assert_eq!(result.initial_h, 3.0);
    }
}
