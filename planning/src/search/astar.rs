use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::classical::{State, Task};
use crate::heuristics::Heuristic;
use crate::search::{Cost, NodeId, SearchAlgorithm, SearchResult, SearchSpace};

/// What the priority queue orders on.
#[derive(Clone, Copy)]
pub(crate) enum QueueKey {
    /// `f = g + h`, as in A*.
    FCost,
    /// `h` alone, as in greedy best-first search.
    HCost,
}

/// Priority-queue entry. The ordering is reversed so that Rust's binary
/// max-heap pops the entry with the smallest key first, breaking ties by
/// ascending node id (insertion order, FIFO within equal keys).
struct OpenEntry {
    key: Cost,
    id: NodeId,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key.total_cmp(&self.key).then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

/// Best-first search over the grounded task.
///
/// `frontier_g` maps each state currently in the heap to its best known
/// g-cost; `closed` holds states whose key has been committed. Duplicate heap
/// entries for one state may exist, the closed check on pop discards the
/// stale ones.
pub(crate) fn best_first(
    task: Arc<Task>,
    timeout: Duration,
    heuristic: &mut dyn Heuristic,
    key_kind: QueueKey,
) -> SearchResult {
    let mut space = SearchSpace::new(task.clone(), timeout);
    let init = task.init.clone();
    if task.is_goal(&init) {
        return SearchSpace::solved_trivially();
    }

    let initial_h = heuristic.evaluate(&init);
    let root = space.create_node(init.clone(), None, None, 0, initial_h);
    let key = |space: &SearchSpace, id: NodeId| match key_kind {
        QueueKey::FCost => space.node(id).f(),
        QueueKey::HCost => space.node(id).h,
    };

    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        key: key(&space, root),
        id: root,
    });
    let mut frontier_g: HashMap<State, u32> = HashMap::from([(init, 0)]);
    let mut closed: HashSet<State> = HashSet::new();

    while let Some(entry) = open.pop() {
        if space.timed_out() {
            return space.timeout_result(initial_h);
        }
        let id = entry.id;
        let state = space.node(id).state.clone();
        if closed.contains(&state) {
            // stale duplicate of an already committed state
            continue;
        }
        closed.insert(state.clone());
        frontier_g.remove(&state);
        space.mark_expanded(id);

        if task.is_goal(&state) {
            return space.solved(id, initial_h);
        }

        let g = space.node(id).g;
        for op in task.applicable(&state) {
            debug_assert!(task.action(op).applicable(&state));
            let successor = task.action(op).apply(&state);
            space.count_generated();
            if closed.contains(&successor) {
                continue;
            }
            let child_g = g + 1;
            if frontier_g.get(&successor).is_some_and(|&known| known <= child_g) {
                continue;
            }
            let h = heuristic.evaluate(&successor);
            let child = space.create_node(successor.clone(), Some(op), Some(id), child_g, h);
            frontier_g.insert(successor, child_g);
            open.push(OpenEntry {
                key: key(&space, child),
                id: child,
            });
        }
    }
    space.exhausted(initial_h)
}

/// A* search: the frontier is keyed by `f = g + h`.
///
/// With a consistent heuristic (h-max) and unit costs the returned plan is
/// optimal. The default pairing with h-add trades that guarantee for speed:
/// the search stays complete but is satisficing only.
pub struct AStar {
    task: Arc<Task>,
    timeout: Duration,
    heuristic: Box<dyn Heuristic + Send>,
}

impl AStar {
    pub fn new(task: Arc<Task>, timeout: Duration, heuristic: Box<dyn Heuristic + Send>) -> AStar {
        AStar {
            task,
            timeout,
            heuristic,
        }
    }
}

impl SearchAlgorithm for AStar {
    fn search(&mut self) -> SearchResult {
        best_first(self.task.clone(), self.timeout, self.heuristic.as_mut(), QueueKey::FCost)
    }
}
