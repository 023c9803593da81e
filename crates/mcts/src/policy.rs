//! Tree and default policies.
//!
//! The [`TreePolicy`] ranks tried actions while descending the tree. The
//! [`DefaultPolicy`] assigns a return estimate to the node produced by an
//! iteration. Both are object safe, so callers can hand the search either
//! concrete types or boxed trait objects.

use crate::node::{ActionNodeId, StateNodeId};
use crate::tree::Tree;
use gmcts_core::State;
use rand::{Rng, RngCore};

/// Strategy for scoring sibling action nodes during selection.
pub trait TreePolicy<S: State> {
    /// Score of `action`; the search descends into the highest score.
    fn score(&self, tree: &Tree<S>, action: ActionNodeId) -> f64;
}

impl<S: State, P: TreePolicy<S> + ?Sized> TreePolicy<S> for &P {
    fn score(&self, tree: &Tree<S>, action: ActionNodeId) -> f64 {
        (**self).score(tree, action)
    }
}

impl<S: State, P: TreePolicy<S> + ?Sized> TreePolicy<S> for Box<P> {
    fn score(&self, tree: &Tree<S>, action: ActionNodeId) -> f64 {
        (**self).score(tree, action)
    }
}

/// Upper confidence bound for trees.
///
/// UCB1(a) = Q(a) + c * sqrt(2 * ln(N_parent) / N(a))
///
/// An action that was never visited scores `+inf`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ucb1 {
    /// Exploration constant `c`.
    pub exploration: f64,
}

impl Ucb1 {
    /// UCB1 with exploration constant `exploration`.
    pub fn new(exploration: f64) -> Self {
        Self { exploration }
    }
}

impl<S: State> TreePolicy<S> for Ucb1 {
    fn score(&self, tree: &Tree<S>, action: ActionNodeId) -> f64 {
        let node = tree.action_node(action);
        if node.visits == 0 {
            return f64::INFINITY;
        }

        let parent_visits = tree.state_node(node.parent()).visits.max(1) as f64;
        let n = node.visits as f64;
        node.q + self.exploration * (2.0 * parent_visits.ln() / n).sqrt()
    }
}

/// Strategy for estimating the return of a freshly produced node.
pub trait DefaultPolicy<S: State> {
    /// Return estimate for `node`. Stochastic policies draw from `rng`.
    fn evaluate(&self, tree: &Tree<S>, node: StateNodeId, rng: &mut dyn RngCore) -> f64;
}

impl<S: State, P: DefaultPolicy<S> + ?Sized> DefaultPolicy<S> for &P {
    fn evaluate(&self, tree: &Tree<S>, node: StateNodeId, rng: &mut dyn RngCore) -> f64 {
        (**self).evaluate(tree, node, rng)
    }
}

impl<S: State, P: DefaultPolicy<S> + ?Sized> DefaultPolicy<S> for Box<P> {
    fn evaluate(&self, tree: &Tree<S>, node: StateNodeId, rng: &mut dyn RngCore) -> f64 {
        (**self).evaluate(tree, node, rng)
    }
}

/// Reward of the transition that produced the node, i.e. a rollout of
/// depth zero.
///
/// The root was not produced by a transition and evaluates to 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImmediateReward;

fn transition_reward<S: State>(tree: &Tree<S>, node: StateNodeId) -> f64 {
    let state_node = tree.state_node(node);
    match state_node.parent() {
        Some(parent) => {
            let action_node = tree.action_node(parent);
            let parent_state = tree.state_node(action_node.parent()).state();
            state_node.state().reward(parent_state, action_node.action())
        }
        None => 0.0,
    }
}

impl<S: State> DefaultPolicy<S> for ImmediateReward {
    fn evaluate(&self, tree: &Tree<S>, node: StateNodeId, _rng: &mut dyn RngCore) -> f64 {
        transition_reward(tree, node)
    }
}

/// Immediate reward plus a discounted uniform random playout.
///
/// The playout starts at the node's state and stops after `max_depth`
/// moves, on a terminal state, or on a state without actions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomRollout {
    /// Maximum number of random moves after the node.
    pub max_depth: usize,

    /// Per-step discount applied to rewards collected during the playout.
    pub discount: f64,
}

impl RandomRollout {
    /// Playouts of at most `max_depth` moves, discounted by `discount` per move.
    pub fn new(max_depth: usize, discount: f64) -> Self {
        Self {
            max_depth,
            discount,
        }
    }
}

impl<S: State> DefaultPolicy<S> for RandomRollout {
    fn evaluate(&self, tree: &Tree<S>, node: StateNodeId, rng: &mut dyn RngCore) -> f64 {
        let mut total = transition_reward(tree, node);
        let mut state = tree.state_node(node).state().clone();
        let mut weight = 1.0;

        for _ in 0..self.max_depth {
            if state.is_terminal() {
                break;
            }
            let actions = state.actions();
            if actions.is_empty() {
                break;
            }

            let action = &actions[rng.gen_range(0..actions.len())];
            let next = state.perform(action, rng);
            weight *= self.discount;
            total += weight * next.reward(&state, action);
            state = next;
        }

        total
    }
}
