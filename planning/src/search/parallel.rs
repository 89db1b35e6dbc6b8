use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use tracing::debug;

use crate::classical::Task;
use crate::heuristics::HeuristicKind;
use crate::search::{run_search, AlgorithmKind, SearchResult};

/// The `(algorithm, heuristic)` pairs raced against each other.
pub const RACE_CONFIGS: [(AlgorithmKind, Option<HeuristicKind>); 4] = [
    (AlgorithmKind::Greedy, Some(HeuristicKind::GoalCount)),
    (AlgorithmKind::AStar, Some(HeuristicKind::GoalCount)),
    (AlgorithmKind::AStar, Some(HeuristicKind::HAdd)),
    (AlgorithmKind::Bfs, None),
];

/// A successful configuration together with its result.
#[derive(Debug)]
pub struct RaceWinner {
    pub algorithm: AlgorithmKind,
    pub heuristic: Option<HeuristicKind>,
    pub result: SearchResult,
}

/// Races every configuration of [`RACE_CONFIGS`] on its own worker thread
/// over the shared read-only task and returns the shortest successful plan,
/// or `None` when no worker succeeds.
///
/// Workers poll the timeout themselves at each expansion; the dispatcher
/// grants them one extra second before walking away. Among equally short
/// plans the first one received wins, so which configuration is reported is
/// not deterministic; callers must not rely on it.
pub fn race(task: &Arc<Task>, timeout: Duration) -> Option<RaceWinner> {
    let (sender, receiver) = unbounded();
    for (algorithm, heuristic) in RACE_CONFIGS {
        let task = Arc::clone(task);
        let sender = sender.clone();
        thread::spawn(move || {
            let result = run_search(task, algorithm, heuristic, timeout);
            // the dispatcher may have hung up already
            let _ = sender.send((algorithm, heuristic, result));
        });
    }
    drop(sender);

    let deadline = Instant::now() + timeout + Duration::from_secs(1);
    let mut best: Option<RaceWinner> = None;
    for _ in 0..RACE_CONFIGS.len() {
        let Ok((algorithm, heuristic, result)) = receiver.recv_deadline(deadline) else {
            // remaining workers are discarded; they terminate on their own probe
            break;
        };
        debug!(%algorithm, success = result.success, plan_length = result.plan_length, "race worker finished");
        if !result.success {
            continue;
        }
        if best
            .as_ref()
            .map_or(true, |b| result.plan_length < b.result.plan_length)
        {
            best = Some(RaceWinner {
                algorithm,
                heuristic,
                result,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classical::Atom;
    use crate::heuristics::relaxed::tests::chain_task;

    #[test]
    fn returns_a_shortest_plan() {
        let task = Arc::new(chain_task());
        let winner = race(&task, Duration::from_secs(10)).unwrap();
        assert!(winner.result.success);
        assert_eq!(winner.result.plan_length, 2);
        assert_eq!(winner.result.plan_names(&task), vec!["step1", "step2"]);
    }

    #[test]
    fn unsolvable_task_yields_no_winner() {
        let mut task = chain_task();
        task.goal.insert(Atom::from("unreachable"));
        assert!(race(&Arc::new(task), Duration::from_secs(10)).is_none());
    }
}
