//! Generic Monte Carlo Tree Search.
//!
//! This crate provides an MCTS engine that can plan over any domain
//! implementing the `gmcts_core::State` trait.
//!
//! # Features
//!
//! - **Generic**: Works with any `State` implementation, deterministic or
//!   stochastic
//! - **Pluggable strategies**: tree policy, default policy and backup rule
//!   are traits, with UCB1, immediate reward, random rollouts and Monte
//!   Carlo backup provided
//! - **Stochastic outcomes**: repeated results of an action share one node
//!   and are counted
//! - **Reproducible**: all randomness comes from a caller-supplied RNG
//! - **Stepwise**: iterations can be driven one at a time
//!
//! # Example
//!
//! ```
//! use gmcts::{games::Maze, Mcts, MctsConfig, Tree};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut tree = Tree::new(Maze::new(3));
//! let root = tree.root();
//!
//! let rng = ChaCha8Rng::seed_from_u64(42);
//! let mut mcts = Mcts::from_config(MctsConfig::with_iterations(1500), rng);
//!
//! let action = mcts.run(&mut tree, root).expect("root has tried actions");
//! println!("Best action: {action}");
//!
//! for node in mcts.best_trace(&tree, root) {
//!     println!("{:?}", tree.state_node(node).state().position());
//! }
//! ```

pub mod backup;
pub mod config;
pub mod games;
pub mod node;
pub mod policy;
pub mod search;
pub mod select;
mod tree;

pub use backup::{BackupRule, MonteCarloBackup};
pub use config::MctsConfig;
pub use gmcts_core::{Result, SearchError, State};
pub use node::{ActionNode, ActionNodeId, Outcome, StateNode, StateNodeId};
pub use policy::{DefaultPolicy, ImmediateReward, RandomRollout, TreePolicy, Ucb1};
pub use search::{ActionStats, Mcts, SearchStats};
pub use select::rand_max;
pub use tree::Tree;
