use rand::RngCore;
use std::fmt::Debug;
use std::hash::Hash;

/// A state of a decision process that can be searched.
///
/// States are immutable values: [`perform`](State::perform) returns a new
/// state instead of mutating `self`. Equality and hashing must be stable,
/// since the engine uses them to recognise repeated outcomes of the same
/// action.
///
/// Transitions may be stochastic. A stochastic domain must draw its
/// randomness from the `rng` handed to `perform` so that searches remain
/// reproducible for a fixed seed.
pub trait State: Clone + Eq + Hash + Debug {
    /// An action that can be taken from a state.
    type Action: Clone + Eq + Hash + Debug;

    /// Returns all legal actions from this state.
    fn actions(&self) -> Vec<Self::Action>;

    /// Applies an action, returning the resulting state.
    fn perform(&self, action: &Self::Action, rng: &mut dyn RngCore) -> Self;

    /// Reward for arriving in this state from `parent` by taking `action`.
    fn reward(&self, parent: &Self, action: &Self::Action) -> f64;

    /// Returns true if no further decisions can be made.
    fn is_terminal(&self) -> bool;
}
