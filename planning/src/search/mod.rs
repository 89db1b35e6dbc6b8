//! Forward state-space search over a grounded task.
//!
//! All algorithms share the same bookkeeping: nodes live in an arena and are
//! addressed by [`NodeId`], parents are arena indices, and every node created
//! is recorded exactly once in the emitted search tree. Failure to find a
//! plan (timeout, exhausted frontier) is a regular [`SearchResult`], not an
//! error.

pub mod astar;
pub mod bfs;
pub mod greedy;
pub mod parallel;

pub use astar::AStar;
pub use bfs::Bfs;
pub use greedy::Greedy;

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

use crate::classical::{Op, PlanStep, State, Task};
use crate::heuristics::HeuristicKind;

/// Cost of reaching or estimating a node. `+∞` signals unreachability.
pub type Cost = f64;

/// Finite stand-in for `+∞` in serialized payloads.
pub const INFINITY_SENTINEL: Cost = 999_999.0;

fn serialize_cost<S: Serializer>(cost: &Cost, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(if cost.is_finite() { *cost } else { INFINITY_SENTINEL })
}

/// Index of a node in the arena of the running search. Ids grow
/// monotonically in creation order and double as tie-breakers.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct NodeId(usize);

/// A node of the search tree, owned by the running search.
#[derive(Clone, Debug)]
pub struct SearchNode {
    pub state: State,
    /// Inbound action; the root has none.
    pub action: Option<Op>,
    pub parent: Option<NodeId>,
    /// Path cost from the root, in unit steps.
    pub g: u32,
    pub h: Cost,
    pub depth: u32,
    is_goal: bool,
    is_expanded: bool,
}

impl SearchNode {
    pub fn f(&self) -> Cost {
        self.g as Cost + self.h
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub state_hash: u64,
    #[serde(serialize_with = "serialize_cost")]
    pub heuristic: Cost,
    pub depth: u32,
    #[serde(serialize_with = "serialize_cost")]
    pub g_cost: Cost,
    pub is_goal: bool,
    pub is_expanded: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct TreeEdge {
    pub source: String,
    pub target: String,
    pub action: String,
}

/// The recorded search tree, emitted with every result (also on timeout and
/// failure) for visualization.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SearchTree {
    pub nodes: Vec<TreeNode>,
    pub edges: Vec<TreeEdge>,
}

/// Search counters and timing, with `+∞` replaced by a finite sentinel when
/// serialized.
#[derive(Clone, Debug, Serialize)]
pub struct Metrics {
    pub nodes_expanded: usize,
    pub nodes_generated: usize,
    pub plan_length: usize,
    pub search_time_ms: f64,
    #[serde(serialize_with = "serialize_cost")]
    pub initial_h: Cost,
    #[serde(serialize_with = "serialize_cost")]
    pub final_h: Cost,
}

/// Outcome of one search run.
#[derive(Clone, Debug)]
pub struct SearchResult {
    pub success: bool,
    pub plan: Vec<Op>,
    pub nodes_expanded: usize,
    pub nodes_generated: usize,
    pub search_time_ms: f64,
    pub plan_length: usize,
    pub initial_h: Cost,
    pub final_h: Cost,
    pub tree: SearchTree,
    pub error_message: Option<String>,
}

impl SearchResult {
    /// The plan as canonical action names.
    pub fn plan_names(&self, task: &Task) -> Vec<String> {
        self.plan.iter().map(|&op| task.action(op).name.to_string()).collect()
    }

    /// The plan as serializable records (action plus its three atom lists).
    pub fn plan_records(&self, task: &Task) -> Vec<PlanStep> {
        self.plan.iter().map(|&op| PlanStep::from(task.action(op))).collect()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            nodes_expanded: self.nodes_expanded,
            nodes_generated: self.nodes_generated,
            plan_length: self.plan_length,
            search_time_ms: self.search_time_ms,
            initial_h: self.initial_h,
            final_h: self.final_h,
        }
    }
}

/// A search algorithm, constructed over a task and a wall-clock timeout.
pub trait SearchAlgorithm {
    fn search(&mut self) -> SearchResult;
}

/// Shared bookkeeping of a running search: the node arena, the counters and
/// the timeout probe.
pub(crate) struct SearchSpace {
    task: Arc<Task>,
    nodes: Vec<SearchNode>,
    expanded: usize,
    generated: usize,
    started: Instant,
    timeout: Duration,
}

impl SearchSpace {
    pub fn new(task: Arc<Task>, timeout: Duration) -> SearchSpace {
        SearchSpace {
            task,
            nodes: Vec::new(),
            expanded: 0,
            generated: 0,
            started: Instant::now(),
            timeout,
        }
    }

    pub fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0]
    }

    /// Allocates a node in the arena. The node is thereby also recorded for
    /// the emitted tree, tagged with a fresh id.
    pub fn create_node(&mut self, state: State, action: Option<Op>, parent: Option<NodeId>, g: u32, h: Cost) -> NodeId {
        let depth = parent.map(|p| self.nodes[p.0].depth + 1).unwrap_or(0);
        let is_goal = self.task.is_goal(&state);
        debug_assert_eq!(action.is_some(), parent.is_some());
        self.nodes.push(SearchNode {
            state,
            action,
            parent,
            g,
            h,
            depth,
            is_goal,
            is_expanded: false,
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn count_generated(&mut self) {
        self.generated += 1;
    }

    pub fn mark_expanded(&mut self, id: NodeId) {
        self.nodes[id.0].is_expanded = true;
        self.expanded += 1;
    }

    pub fn timed_out(&self) -> bool {
        self.started.elapsed() > self.timeout
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Walks the parent chain back to the root and returns the inbound
    /// actions in execution order.
    pub fn extract_plan(&self, goal: NodeId) -> Vec<Op> {
        let mut plan = Vec::with_capacity(self.nodes[goal.0].depth as usize);
        let mut current = goal;
        loop {
            let node = &self.nodes[current.0];
            match (node.action, node.parent) {
                (Some(op), Some(parent)) => {
                    plan.push(op);
                    current = parent;
                }
                _ => break,
            }
        }
        plan.reverse();
        plan
    }

    fn tree(&self) -> SearchTree {
        let label = |id: usize| format!("n{}", id + 1);
        let mut tree = SearchTree::default();
        for (id, node) in self.nodes.iter().enumerate() {
            tree.nodes.push(TreeNode {
                id: label(id),
                state_hash: node.state.fingerprint(),
                heuristic: node.h,
                depth: node.depth,
                g_cost: node.g as Cost,
                is_goal: node.is_goal,
                is_expanded: node.is_expanded,
            });
            if let (Some(parent), Some(op)) = (node.parent, node.action) {
                tree.edges.push(TreeEdge {
                    source: label(parent.0),
                    target: label(id),
                    action: self.task.action(op).name.to_string(),
                });
            }
        }
        tree
    }

    /// Result for an initial state that already satisfies the goal.
    pub fn solved_trivially() -> SearchResult {
        SearchResult {
            success: true,
            plan: vec![],
            nodes_expanded: 0,
            nodes_generated: 1,
            search_time_ms: 0.0,
            plan_length: 0,
            initial_h: 0.0,
            final_h: 0.0,
            tree: SearchTree::default(),
            error_message: None,
        }
    }

    pub fn solved(&self, goal: NodeId, initial_h: Cost) -> SearchResult {
        let plan = self.extract_plan(goal);
        SearchResult {
            success: true,
            plan_length: plan.len(),
            plan,
            nodes_expanded: self.expanded,
            nodes_generated: self.generated,
            search_time_ms: self.elapsed_ms(),
            initial_h,
            final_h: self.nodes[goal.0].h,
            tree: self.tree(),
            error_message: None,
        }
    }

    pub fn timeout_result(&self, initial_h: Cost) -> SearchResult {
        self.failure("Search timeout", initial_h)
    }

    pub fn exhausted(&self, initial_h: Cost) -> SearchResult {
        self.failure("No solution exists", initial_h)
    }

    fn failure(&self, message: &str, initial_h: Cost) -> SearchResult {
        SearchResult {
            success: false,
            plan: vec![],
            nodes_expanded: self.expanded,
            nodes_generated: self.generated,
            search_time_ms: self.elapsed_ms(),
            plan_length: 0,
            initial_h,
            final_h: 0.0,
            tree: self.tree(),
            error_message: Some(message.to_string()),
        }
    }
}

/// The available search algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    Bfs,
    AStar,
    Greedy,
}

impl Display for AlgorithmKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlgorithmKind::Bfs => "bfs",
            AlgorithmKind::AStar => "astar",
            AlgorithmKind::Greedy => "greedy",
        };
        write!(f, "{name}")
    }
}

impl FromStr for AlgorithmKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bfs" => Ok(AlgorithmKind::Bfs),
            "astar" => Ok(AlgorithmKind::AStar),
            "greedy" => Ok(AlgorithmKind::Greedy),
            _ => Err(format!("Unknown algorithm `{s}`")),
        }
    }
}

/// Runs one `(algorithm, heuristic)` configuration to completion. BFS takes
/// no heuristic; the informed algorithms default to goal-count when none is
/// given.
pub fn run_search(
    task: Arc<Task>,
    algorithm: AlgorithmKind,
    heuristic: Option<HeuristicKind>,
    timeout: Duration,
) -> SearchResult {
    let heuristic = heuristic.unwrap_or(HeuristicKind::GoalCount);
    match algorithm {
        AlgorithmKind::Bfs => Bfs::new(task, timeout).search(),
        AlgorithmKind::AStar => {
            let h = heuristic.build(&task);
            AStar::new(task, timeout, h).search()
        }
        AlgorithmKind::Greedy => {
            let h = heuristic.build(&task);
            Greedy::new(task, timeout, h).search()
        }
    }
}
