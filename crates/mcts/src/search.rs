//! Monte Carlo Tree Search driver.
//!
//! Each iteration runs the usual four phases:
//! 1. Selection: descend with the tree policy while nodes are fully expanded
//! 2. Expansion: try one untried action and sample its result state
//! 3. Evaluation: score the produced node with the default policy
//! 4. Backup: propagate that score to the root with the backup rule

use crate::{
    backup::{BackupRule, MonteCarloBackup},
    config::MctsConfig,
    node::{ActionNodeId, StateNodeId},
    policy::{DefaultPolicy, ImmediateReward, TreePolicy, Ucb1},
    select::rand_max,
    tree::Tree,
};
use gmcts_core::{Result, SearchError, State};
use rand::{Rng, RngCore};
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Statistics of one tried action at the root.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionStats<A> {
    pub action: A,
    pub visits: u32,
    pub q: f64,
}

/// Snapshot of the root statistics, for reporting.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchStats<A> {
    /// Visits of the root node.
    pub root_visits: u32,

    /// Number of state nodes in the tree.
    pub tree_size: usize,

    /// One entry per tried root action, in expansion order.
    pub actions: Vec<ActionStats<A>>,
}

impl<A: Clone> SearchStats<A> {
    /// Collect the statistics of `root`'s children.
    pub fn from_tree<S: State<Action = A>>(tree: &Tree<S>, root: StateNodeId) -> Self {
        let node = tree.state_node(root);
        let actions = node
            .children()
            .iter()
            .map(|(action, id)| {
                let child = tree.action_node(*id);
                ActionStats {
                    action: action.clone(),
                    visits: child.visits,
                    q: child.q,
                }
            })
            .collect();

        Self {
            root_visits: node.visits,
            tree_size: tree.len(),
            actions,
        }
    }
}

/// Monte Carlo Tree Search.
///
/// Generic over:
/// - `S`: The domain state being searched
/// - `T`: The tree policy used during descent
/// - `D`: The default policy that evaluates produced nodes
/// - `B`: The backup rule
/// - `R`: The random number generator
///
/// All randomness of a search (action choice, tie-breaking, stochastic
/// transitions, rollouts) is drawn from `R`, so a seeded generator makes the
/// search reproducible.
pub struct Mcts<S, T, D, B, R>
where
    S: State,
    T: TreePolicy<S>,
    D: DefaultPolicy<S>,
    B: BackupRule<S>,
    R: RngCore,
{
    config: MctsConfig,
    tree_policy: T,
    default_policy: D,
    backup: B,
    rng: R,
    _state: PhantomData<fn() -> S>,
}

impl<S, R> Mcts<S, Ucb1, ImmediateReward, MonteCarloBackup, R>
where
    S: State,
    R: RngCore,
{
    /// UCB1 with the configured exploration constant, immediate reward and
    /// Monte Carlo backup.
    pub fn from_config(config: MctsConfig, rng: R) -> Self {
        let tree_policy = Ucb1::new(config.exploration);
        Self::new(config, tree_policy, ImmediateReward, MonteCarloBackup, rng)
    }
}

impl<S, T, D, B, R> Mcts<S, T, D, B, R>
where
    S: State,
    T: TreePolicy<S>,
    D: DefaultPolicy<S>,
    B: BackupRule<S>,
    R: RngCore,
{
    /// Create a new search from its three strategies.
    pub fn new(config: MctsConfig, tree_policy: T, default_policy: D, backup: B, rng: R) -> Self {
        Self {
            config,
            tree_policy,
            default_policy,
            backup,
            rng,
            _state: PhantomData,
        }
    }

    /// The configuration this search was built with.
    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// The tree policy, also used by [`Mcts::best_trace`].
    pub fn tree_policy(&self) -> &T {
        &self.tree_policy
    }

    /// Run `config.iterations` iterations and return the recommended action.
    pub fn run(&mut self, tree: &mut Tree<S>, root: StateNodeId) -> Result<S::Action> {
        self.search(tree, root, self.config.iterations)
    }

    /// Run `iterations` iterations from `root` and return the root action
    /// with the highest mean return.
    ///
    /// # Errors
    /// - `SearchError::InvalidRoot` if `root` has a parent
    /// - `SearchError::EmptyCandidateSet` if the root has no tried actions
    ///   afterwards, e.g. with zero iterations or a terminal root
    pub fn search(
        &mut self,
        tree: &mut Tree<S>,
        root: StateNodeId,
        iterations: usize,
    ) -> Result<S::Action> {
        check_root(tree, root)?;
        debug!(iterations, tree_size = tree.len(), "starting search");

        for _ in 0..iterations {
            self.iterate(tree, root)?;
        }

        let action = self.best_action(tree, root)?;
        debug!(
            tree_size = tree.len(),
            root_visits = tree.state_node(root).visits,
            action = ?action,
            "search finished"
        );
        Ok(action)
    }

    /// Run a single iteration and return the node it evaluated.
    ///
    /// Callers that need cancellation or a time budget can drive the search
    /// with `step` and stop whenever they like.
    pub fn step(&mut self, tree: &mut Tree<S>, root: StateNodeId) -> Result<StateNodeId> {
        check_root(tree, root)?;
        self.iterate(tree, root)
    }

    fn iterate(&mut self, tree: &mut Tree<S>, root: StateNodeId) -> Result<StateNodeId> {
        let node = self.next_node(tree, root)?;
        let reward = self.default_policy.evaluate(tree, node, &mut self.rng);
        tree.state_node_mut(node).reward = reward;
        self.backup.backup(tree, node);

        trace!(
            node = node.index(),
            depth = tree.depth(node),
            reward,
            "iteration complete"
        );
        Ok(node)
    }

    /// Descend from `node` and return the state node to evaluate.
    ///
    /// A node with untried actions is expanded with one of them, chosen
    /// uniformly at random, and the new result state is returned. Fully
    /// expanded nodes are passed through via the best child under the tree
    /// policy. Terminal states, and dead ends without any action, are
    /// returned as they are.
    pub fn next_node(&mut self, tree: &mut Tree<S>, node: StateNodeId) -> Result<StateNodeId> {
        let mut current = node;

        loop {
            let state_node = tree.state_node(current);
            if state_node.state().is_terminal() {
                return Ok(current);
            }

            let untried = state_node.untried_actions();
            if !untried.is_empty() {
                let action = untried[self.rng.gen_range(0..untried.len())].clone();
                let action_id = tree.expand_action(current, &action)?;
                return Ok(tree.sample_result_state(action_id, &mut self.rng));
            }

            if state_node.children().is_empty() {
                return Ok(current);
            }

            let children: Vec<ActionNodeId> =
                state_node.children().iter().map(|(_, id)| *id).collect();
            let tree_policy = &self.tree_policy;
            let best = rand_max(children, |id| tree_policy.score(tree, *id), &mut self.rng)?;

            current = if self.config.resample_transitions {
                tree.sample_result_state(best, &mut self.rng)
            } else {
                tree.draw_outcome(best, &mut self.rng)?
            };
        }
    }

    /// The root action with the highest `q`, ties broken uniformly at random.
    ///
    /// # Errors
    /// Returns `SearchError::EmptyCandidateSet` if the root has no tried
    /// actions.
    pub fn best_action(&mut self, tree: &Tree<S>, root: StateNodeId) -> Result<S::Action> {
        let children = tree.state_node(root).children();
        let (action, _) = rand_max(
            children.iter(),
            |(_, id)| tree.action_node(*id).q,
            &mut self.rng,
        )?;
        Ok(action.clone())
    }

    /// The path the search currently judges best, starting at `root`.
    ///
    /// From each node the trace follows the child with the best tree-policy
    /// score into its most frequent outcome. It stops at terminal nodes and
    /// at nodes that still have untried actions. The tree is not modified
    /// and no randomness is used: score ties go to the more visited action,
    /// then to the one tried first.
    pub fn best_trace(&self, tree: &Tree<S>, root: StateNodeId) -> Vec<StateNodeId> {
        let mut trace = vec![root];
        let mut current = root;

        loop {
            let node = tree.state_node(current);
            if node.state().is_terminal() || !node.is_fully_expanded() {
                break;
            }

            let mut best: Option<(ActionNodeId, f64, u32)> = None;
            for (_, id) in node.children() {
                let score = self.tree_policy.score(tree, *id);
                let visits = tree.action_node(*id).visits;
                let better = match best {
                    None => true,
                    Some((_, s, v)) => score > s || (score == s && visits > v),
                };
                if better {
                    best = Some((*id, score, visits));
                }
            }

            let Some((action, _, _)) = best else { break };
            let Some(next) = tree.most_frequent_outcome(action) else { break };
            trace.push(next);
            current = next;
        }

        trace
    }
}

fn check_root<S: State>(tree: &Tree<S>, root: StateNodeId) -> Result<()> {
    if tree.state_node(root).is_root() {
        Ok(())
    } else {
        Err(SearchError::InvalidRoot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{Direction, Maze};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    type DefaultMcts = Mcts<Maze, Ucb1, ImmediateReward, MonteCarloBackup, ChaCha8Rng>;

    fn create_mcts(seed: u64) -> DefaultMcts {
        Mcts::from_config(MctsConfig::default(), ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_next_node_expands_root_first() {
        let mut mcts = create_mcts(0);
        let mut tree = Tree::new(Maze::new(3));
        let root = tree.root();

        for expanded in 1..=4 {
            let node = mcts.next_node(&mut tree, root).unwrap();
            assert_eq!(tree.depth(node), 1);
            assert_eq!(tree.state_node(root).children().len(), expanded);
        }
        assert!(tree.state_node(root).is_fully_expanded());
    }

    #[test]
    fn test_fully_expanded_root_is_never_reexpanded() {
        let mut mcts = create_mcts(1);
        let mut tree = Tree::new(Maze::new(3));
        let root = tree.root();

        for _ in 0..4 {
            mcts.step(&mut tree, root).unwrap();
        }
        assert_eq!(tree.action_len(), 4);

        for _ in 0..20 {
            let node = mcts.step(&mut tree, root).unwrap();
            assert_eq!(tree.state_node(root).children().len(), 4);
            assert!(tree.depth(node) >= 2);
        }
    }

    #[test]
    fn test_step_rejects_non_root() {
        let mut mcts = create_mcts(2);
        let mut tree = Tree::new(Maze::new(3));
        let root = tree.root();
        let child = mcts.step(&mut tree, root).unwrap();

        assert_eq!(mcts.step(&mut tree, child), Err(SearchError::InvalidRoot));
        assert_eq!(mcts.search(&mut tree, child, 5), Err(SearchError::InvalidRoot));
    }

    #[test]
    fn test_zero_iterations() {
        let mut mcts = create_mcts(3);
        let mut tree = Tree::new(Maze::new(3));
        let root = tree.root();

        assert_eq!(
            mcts.search(&mut tree, root, 0),
            Err(SearchError::EmptyCandidateSet)
        );
        assert_eq!(tree.state_node(root).visits, 0);
        assert!(tree.state_node(root).children().is_empty());
        assert_eq!(mcts.best_trace(&tree, root), vec![root]);
    }

    #[test]
    fn test_terminal_root() {
        let mut mcts = create_mcts(4);
        let mut tree = Tree::new(Maze::new(3).with_terminal_goal().at(2, 2));
        let root = tree.root();

        assert_eq!(
            mcts.search(&mut tree, root, 10),
            Err(SearchError::EmptyCandidateSet)
        );
        assert_eq!(tree.state_node(root).visits, 10);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_one_step_from_goal() {
        let mut mcts = create_mcts(5);
        let mut tree = Tree::new(Maze::new(3).with_terminal_goal().at(2, 1));
        let root = tree.root();

        let action = mcts.search(&mut tree, root, 200).unwrap();
        assert_eq!(action, Direction::Down);

        let trace = mcts.best_trace(&tree, root);
        assert_eq!(trace.len(), 2);
        assert!(tree.state_node(trace[1]).state().at_goal());
    }

    #[test]
    fn test_same_seed_same_search() {
        let run = |seed: u64| {
            let mut mcts = create_mcts(seed);
            let mut tree = Tree::new(Maze::new(3));
            let root = tree.root();
            let action = mcts.search(&mut tree, root, 300).unwrap();
            (action, SearchStats::from_tree(&tree, root))
        };

        assert_eq!(run(12345), run(12345));
    }

    #[test]
    fn test_stats_summarize_root() {
        let mut mcts = create_mcts(6);
        let mut tree = Tree::new(Maze::new(3));
        let root = tree.root();
        mcts.search(&mut tree, root, 100).unwrap();

        let stats = SearchStats::from_tree(&tree, root);
        assert_eq!(stats.root_visits, 100);
        assert_eq!(stats.tree_size, tree.len());
        assert_eq!(stats.actions.len(), 4);
        assert_eq!(stats.actions.iter().map(|a| a.visits).sum::<u32>(), 100);
    }

    // Start leads to Stuck, which is not terminal but has no moves.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    enum Corridor {
        Start,
        Stuck,
    }

    impl State for Corridor {
        type Action = ();

        fn actions(&self) -> Vec<()> {
            match self {
                Corridor::Start => vec![()],
                Corridor::Stuck => Vec::new(),
            }
        }

        fn perform(&self, _action: &(), _rng: &mut dyn RngCore) -> Self {
            Corridor::Stuck
        }

        fn reward(&self, _parent: &Self, _action: &()) -> f64 {
            -1.0
        }

        fn is_terminal(&self) -> bool {
            false
        }
    }

    fn corridor_mcts(seed: u64) -> Mcts<Corridor, Ucb1, ImmediateReward, MonteCarloBackup, ChaCha8Rng> {
        Mcts::from_config(MctsConfig::default(), ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_dead_end_root_is_returned() {
        let mut mcts = corridor_mcts(8);
        let mut tree = Tree::new(Corridor::Stuck);
        let root = tree.root();

        assert_eq!(mcts.next_node(&mut tree, root), Ok(root));
        assert_eq!(tree.len(), 1);

        assert_eq!(mcts.step(&mut tree, root), Ok(root));
        assert_eq!(tree.state_node(root).visits, 1);
        assert_eq!(tree.state_node(root).reward, 0.0);
        assert_eq!(tree.action_len(), 0);

        assert_eq!(
            mcts.search(&mut tree, root, 5),
            Err(SearchError::EmptyCandidateSet)
        );
        assert_eq!(tree.state_node(root).visits, 6);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_dead_end_below_root_is_a_leaf() {
        let mut mcts = corridor_mcts(9);
        let mut tree = Tree::new(Corridor::Start);
        let root = tree.root();

        let stuck = mcts.step(&mut tree, root).unwrap();
        assert_eq!(tree.state_node(stuck).state(), &Corridor::Stuck);

        for visits in 2..=5 {
            assert_eq!(mcts.step(&mut tree, root), Ok(stuck));
            assert_eq!(tree.state_node(stuck).visits, visits);
        }
        assert_eq!(tree.len(), 2);
        assert_eq!(mcts.search(&mut tree, root, 3), Ok(()));
        assert_eq!(tree.state_node(root).visits, 8);
    }

    #[test]
    fn test_replayed_outcomes_keep_tree_small() {
        let config = MctsConfig::with_iterations(300).replay_outcomes();
        let mut mcts: DefaultMcts = Mcts::from_config(config, ChaCha8Rng::seed_from_u64(7));
        let mut tree = Tree::new(Maze::new(3).with_slip(50));
        let root = tree.root();
        mcts.run(&mut tree, root).unwrap();

        // Replaying never adds a second outcome to an action node.
        for (_, id) in tree.state_node(root).children() {
            assert_eq!(tree.action_node(*id).outcomes().len(), 1);
            assert_eq!(tree.action_node(*id).outcome_count(), tree.action_node(*id).visits);
        }
    }
}
