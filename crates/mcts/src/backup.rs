//! Backup rules: propagate a node's return estimate to its ancestors.

use crate::node::StateNodeId;
use crate::tree::Tree;
use gmcts_core::State;

/// Strategy for propagating statistics from a freshly evaluated node up to
/// the root.
pub trait BackupRule<S: State> {
    /// Called right after the node's `reward` has been set.
    fn backup(&self, tree: &mut Tree<S>, node: StateNodeId);
}

impl<S: State, B: BackupRule<S> + ?Sized> BackupRule<S> for &B {
    fn backup(&self, tree: &mut Tree<S>, node: StateNodeId) {
        (**self).backup(tree, node)
    }
}

impl<S: State, B: BackupRule<S> + ?Sized> BackupRule<S> for Box<B> {
    fn backup(&self, tree: &mut Tree<S>, node: StateNodeId) {
        (**self).backup(tree, node)
    }
}

/// Monte Carlo backup.
///
/// Every state node on the path gains a visit. Every action node on the
/// path gains a visit and folds the leaf's reward into its running mean
/// `q`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonteCarloBackup;

impl<S: State> BackupRule<S> for MonteCarloBackup {
    fn backup(&self, tree: &mut Tree<S>, node: StateNodeId) {
        let value = tree.state_node(node).reward;
        tree.state_node_mut(node).visits += 1;

        let mut current = node;
        while let Some(parent) = tree.state_node(current).parent() {
            tree.action_node_mut(parent).record(value);
            current = tree.action_node(parent).parent();
            tree.state_node_mut(current).visits += 1;
        }
    }
}
