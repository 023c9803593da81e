//! Serializable summaries of search runs.

use gmcts::{games::Direction, games::Maze, SearchStats, StateNodeId, Tree};
use serde::Serialize;

/// Statistics of one root action.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ActionReport {
    pub action: String,
    pub visits: u32,
    pub q: f64,
}

/// Outcome of a single search.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PlanReport {
    /// Recommended action at the root.
    pub action: String,

    #[serde(skip)]
    pub direction: Direction,

    pub root_visits: u32,
    pub tree_size: usize,
    pub actions: Vec<ActionReport>,

    /// Agent positions along the best trace, root first.
    pub trace: Vec<(i32, i32)>,
}

impl PlanReport {
    pub fn new(tree: &Tree<Maze>, root: StateNodeId, action: &Direction, trace: &[StateNodeId]) -> Self {
        let stats = SearchStats::from_tree(tree, root);
        Self {
            action: action.to_string(),
            direction: *action,
            root_visits: stats.root_visits,
            tree_size: stats.tree_size,
            actions: stats
                .actions
                .into_iter()
                .map(|a| ActionReport {
                    action: a.action.to_string(),
                    visits: a.visits,
                    q: a.q,
                })
                .collect(),
            trace: trace
                .iter()
                .map(|id| tree.state_node(*id).state().position())
                .collect(),
        }
    }
}

/// Aggregate over many independent searches.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub optimal: usize,
    pub total: usize,
    pub mean_tree_size: f64,
}

impl EvaluationResult {
    /// Share of runs whose first move was optimal.
    pub fn optimal_rate(&self) -> f64 {
        self.optimal as f64 / self.total as f64
    }
}
