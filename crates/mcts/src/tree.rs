//! Arena-allocated search tree.
//!
//! State nodes and action nodes are stored in two vectors and referenced by
//! index. Children lists are the owning edges; parent indices only exist so
//! backups can walk towards the root.

use crate::node::{ActionNode, ActionNodeId, Outcome, StateNode, StateNodeId};
use gmcts_core::{Result, SearchError, State};
use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;

/// Search tree over states of type `S`.
///
/// The tree only grows: nodes are never removed during a search.
#[derive(Clone, Debug)]
pub struct Tree<S: State> {
    states: Vec<StateNode<S>>,
    actions: Vec<ActionNode<S>>,
}

impl<S: State> Tree<S> {
    /// Create a tree holding a single root node for `state`.
    pub fn new(state: S) -> Self {
        Self {
            states: vec![StateNode::new(state, None)],
            actions: Vec::new(),
        }
    }

    /// Id of the root node.
    pub fn root(&self) -> StateNodeId {
        StateNodeId::ROOT
    }

    /// Get a state node by ID.
    ///
    /// # Panics
    /// Panics if the id does not belong to this tree.
    pub fn state_node(&self, id: StateNodeId) -> &StateNode<S> {
        &self.states[id.0]
    }

    /// Get an action node by ID.
    ///
    /// # Panics
    /// Panics if the id does not belong to this tree.
    pub fn action_node(&self, id: ActionNodeId) -> &ActionNode<S> {
        &self.actions[id.0]
    }

    pub(crate) fn state_node_mut(&mut self, id: StateNodeId) -> &mut StateNode<S> {
        &mut self.states[id.0]
    }

    pub(crate) fn action_node_mut(&mut self, id: ActionNodeId) -> &mut ActionNode<S> {
        &mut self.actions[id.0]
    }

    /// Number of state nodes in the tree.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false, the root exists from construction.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of action nodes in the tree.
    pub fn action_len(&self) -> usize {
        self.actions.len()
    }

    /// Ids of all state nodes, in creation order.
    pub fn state_ids(&self) -> impl Iterator<Item = StateNodeId> {
        (0..self.states.len()).map(StateNodeId)
    }

    /// Ids of all action nodes, in creation order.
    pub fn action_ids(&self) -> impl Iterator<Item = ActionNodeId> {
        (0..self.actions.len()).map(ActionNodeId)
    }

    /// Action node for `action` below `node`, if it has been tried.
    pub fn child(&self, node: StateNodeId, action: &S::Action) -> Option<ActionNodeId> {
        self.state_node(node)
            .children
            .iter()
            .find(|(a, _)| a == action)
            .map(|(_, id)| *id)
    }

    /// Number of state-node hops between `node` and the root.
    pub fn depth(&self, node: StateNodeId) -> usize {
        let mut depth = 0;
        let mut current = node;
        while let Some(parent) = self.state_node(current).parent {
            current = self.action_node(parent).parent;
            depth += 1;
        }
        depth
    }

    /// Move `action` from the untried list of `node` into a new action node.
    ///
    /// # Errors
    /// Returns `SearchError::InvalidAction` if the action is not untried.
    pub fn expand_action(&mut self, node: StateNodeId, action: &S::Action) -> Result<ActionNodeId> {
        let position = self
            .state_node(node)
            .untried_actions
            .iter()
            .position(|a| a == action)
            .ok_or_else(|| SearchError::InvalidAction(format!("{action:?}")))?;

        let action = self.state_node_mut(node).untried_actions.swap_remove(position);
        let id = ActionNodeId(self.actions.len());
        self.actions.push(ActionNode::new(node, action.clone()));
        self.state_node_mut(node).children.push((action, id));
        Ok(id)
    }

    /// Perform the action once and return the node for the resulting state.
    ///
    /// A state that was already observed for this action reuses its node and
    /// bumps its occurrence count, so statistics accumulate across repeated
    /// outcomes of a stochastic transition.
    pub fn sample_result_state(&mut self, action: ActionNodeId, rng: &mut dyn RngCore) -> StateNodeId {
        let next = {
            let action_node = self.action_node(action);
            let parent = self.state_node(action_node.parent);
            parent.state.perform(&action_node.action, rng)
        };

        let existing = self
            .action_node(action)
            .outcomes
            .iter()
            .position(|o| self.states[o.node.0].state == next);

        match existing {
            Some(i) => {
                let outcome = &mut self.action_node_mut(action).outcomes[i];
                outcome.count += 1;
                outcome.node
            }
            None => {
                let id = StateNodeId(self.states.len());
                self.states.push(StateNode::new(next, Some(action)));
                self.action_node_mut(action)
                    .outcomes
                    .push(Outcome { node: id, count: 1 });
                id
            }
        }
    }

    /// Draw one of the already observed outcomes of `action`, weighted by
    /// occurrence count, and bump its count. The transition is not
    /// performed again.
    ///
    /// # Errors
    /// Returns `SearchError::EmptyCandidateSet` if the action has no outcomes.
    pub fn draw_outcome(&mut self, action: ActionNodeId, rng: &mut dyn RngCore) -> Result<StateNodeId> {
        let weights: Vec<u32> = self.action_node(action).outcomes.iter().map(|o| o.count).collect();
        let index = WeightedIndex::new(&weights).map_err(|_| SearchError::EmptyCandidateSet)?;
        let outcome = &mut self.action_node_mut(action).outcomes[index.sample(rng)];
        outcome.count += 1;
        Ok(outcome.node)
    }

    /// The outcome sampled most often for `action`; ties go to the first
    /// observed.
    pub fn most_frequent_outcome(&self, action: ActionNodeId) -> Option<StateNodeId> {
        let mut best: Option<Outcome> = None;
        for outcome in &self.action_node(action).outcomes {
            if best.map_or(true, |b| outcome.count > b.count) {
                best = Some(*outcome);
            }
        }
        best.map(|o| o.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    // Counter that adds the action; action 0 is a coin flip between 0 and 10.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Counter(u32);

    impl State for Counter {
        type Action = u32;

        fn actions(&self) -> Vec<u32> {
            vec![0, 1, 2]
        }

        fn perform(&self, action: &u32, rng: &mut dyn RngCore) -> Self {
            match action {
                0 if rng.gen_bool(0.5) => Counter(self.0 + 10),
                _ => Counter(self.0 + action),
            }
        }

        fn reward(&self, _parent: &Self, _action: &u32) -> f64 {
            self.0 as f64
        }

        fn is_terminal(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_new_root() {
        let tree = Tree::new(Counter(0));
        let root = tree.state_node(tree.root());

        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert_eq!(tree.action_len(), 0);
        assert!(root.parent().is_none());
        assert_eq!(root.untried_actions(), &[0, 1, 2]);
        assert_eq!(root.visits, 0);
    }

    #[test]
    fn test_expand_moves_action_to_children() {
        let mut tree = Tree::new(Counter(0));
        let id = tree.expand_action(tree.root(), &1).unwrap();

        let root = tree.state_node(tree.root());
        assert!(!root.untried_actions().contains(&1));
        assert_eq!(root.children(), &[(1, id)]);
        assert_eq!(tree.child(tree.root(), &1), Some(id));
        assert_eq!(tree.action_node(id).parent(), tree.root());
        assert_eq!(tree.action_node(id).visits, 0);
    }

    #[test]
    fn test_expand_rejects_tried_or_unknown_action() {
        let mut tree = Tree::new(Counter(0));
        tree.expand_action(tree.root(), &2).unwrap();

        assert_eq!(
            tree.expand_action(tree.root(), &2),
            Err(SearchError::InvalidAction("2".to_string()))
        );
        assert!(matches!(
            tree.expand_action(tree.root(), &7),
            Err(SearchError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_sample_reuses_existing_outcome() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut tree = Tree::new(Counter(0));
        let action = tree.expand_action(tree.root(), &2).unwrap();

        let first = tree.sample_result_state(action, &mut rng);
        let second = tree.sample_result_state(action, &mut rng);

        assert_eq!(first, second);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.action_node(action).outcomes(), &[Outcome { node: first, count: 2 }]);
        assert_eq!(tree.state_node(first).state(), &Counter(2));
        assert_eq!(tree.state_node(first).parent(), Some(action));
        assert_eq!(tree.depth(first), 1);
    }

    #[test]
    fn test_sample_tracks_stochastic_outcomes() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut tree = Tree::new(Counter(0));
        let action = tree.expand_action(tree.root(), &0).unwrap();

        for _ in 0..200 {
            tree.sample_result_state(action, &mut rng);
        }

        let node = tree.action_node(action);
        assert_eq!(node.outcomes().len(), 2);
        assert_eq!(node.outcome_count(), 200);
        for outcome in node.outcomes() {
            // Fair coin: each side should show up often.
            assert!(outcome.count > 60, "count {} too low", outcome.count);
        }
    }

    #[test]
    fn test_draw_outcome_follows_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut tree = Tree::new(Counter(0));
        let action = tree.expand_action(tree.root(), &1).unwrap();

        assert_eq!(tree.draw_outcome(action, &mut rng), Err(SearchError::EmptyCandidateSet));

        let node = tree.sample_result_state(action, &mut rng);
        assert_eq!(tree.draw_outcome(action, &mut rng), Ok(node));
        assert_eq!(tree.action_node(action).outcome_count(), 2);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_most_frequent_outcome() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut tree = Tree::new(Counter(0));
        let action = tree.expand_action(tree.root(), &1).unwrap();
        assert_eq!(tree.most_frequent_outcome(action), None);

        let node = tree.sample_result_state(action, &mut rng);
        assert_eq!(tree.most_frequent_outcome(action), Some(node));
    }
}
