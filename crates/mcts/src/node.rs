//! Node types for the search tree.
//!
//! Nodes live in the [`Tree`](crate::tree::Tree) arena and refer to each
//! other by index. Forward edges (a node's children) are the owning edges;
//! `parent` fields are plain back-references used only while backing up.

use gmcts_core::State;

/// Index of a [`StateNode`] in the tree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateNodeId(pub(crate) usize);

impl StateNodeId {
    /// The root node is always at index 0.
    pub const ROOT: StateNodeId = StateNodeId(0);

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of an [`ActionNode`] in the tree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionNodeId(pub(crate) usize);

impl ActionNodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A reachable situation in the search tree.
#[derive(Clone, Debug)]
pub struct StateNode<S: State> {
    pub(crate) state: S,

    /// The action node this state was sampled from (None for root).
    pub(crate) parent: Option<ActionNodeId>,

    /// Tried actions, in the order they were expanded.
    pub(crate) children: Vec<(S::Action, ActionNodeId)>,

    /// Legal actions that have no action node yet.
    pub(crate) untried_actions: Vec<S::Action>,

    /// Number of completed backups that passed through this node.
    pub visits: u32,

    /// Return estimate most recently assigned by the default policy.
    pub reward: f64,
}

impl<S: State> StateNode<S> {
    pub(crate) fn new(state: S, parent: Option<ActionNodeId>) -> Self {
        let untried_actions = state.actions();
        Self {
            state,
            parent,
            children: Vec::new(),
            untried_actions,
            visits: 0,
            reward: 0.0,
        }
    }

    /// The domain state this node stands for.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// The action node this state was sampled from.
    pub fn parent(&self) -> Option<ActionNodeId> {
        self.parent
    }

    /// Tried actions and their action nodes, in expansion order.
    pub fn children(&self) -> &[(S::Action, ActionNodeId)] {
        &self.children
    }

    /// Legal actions not expanded yet.
    pub fn untried_actions(&self) -> &[S::Action] {
        &self.untried_actions
    }

    /// True if the node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// True once every legal action has an action node.
    pub fn is_fully_expanded(&self) -> bool {
        self.untried_actions.is_empty()
    }
}

/// One observed result of an action: the state node it led to and how many
/// times it was sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub node: StateNodeId,
    pub count: u32,
}

/// A tried action from a specific state node.
///
/// With stochastic transitions one action can lead to several distinct
/// states; each is kept as an [`Outcome`] with its occurrence count.
#[derive(Clone, Debug)]
pub struct ActionNode<S: State> {
    pub(crate) parent: StateNodeId,
    pub(crate) action: S::Action,
    pub(crate) outcomes: Vec<Outcome>,

    /// Number of times this action was expanded or selected.
    pub visits: u32,

    /// Running mean of the returns backed up through this action.
    pub q: f64,
}

impl<S: State> ActionNode<S> {
    pub(crate) fn new(parent: StateNodeId, action: S::Action) -> Self {
        Self {
            parent,
            action,
            outcomes: Vec::new(),
            visits: 0,
            q: 0.0,
        }
    }

    /// The state node the action was tried from.
    pub fn parent(&self) -> StateNodeId {
        self.parent
    }

    /// The tried action.
    pub fn action(&self) -> &S::Action {
        &self.action
    }

    /// Observed result states, in the order they were first sampled.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Sum of the occurrence counts of all outcomes.
    pub fn outcome_count(&self) -> u32 {
        self.outcomes.iter().map(|o| o.count).sum()
    }

    /// Fold one more return into the running mean.
    pub(crate) fn record(&mut self, value: f64) {
        self.visits += 1;
        self.q += (value - self.q) / self.visits as f64;
    }
}
