//! Search configuration parameters.

/// Search configuration parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct MctsConfig {
    /// Number of iterations used by [`Mcts::run`](crate::Mcts::run).
    pub iterations: usize,

    /// UCB1 exploration constant for the default strategy stack.
    pub exploration: f64,

    /// How descent picks the result state of an already tried action.
    /// - true: perform the transition again, so unseen outcomes can appear
    /// - false: replay an observed outcome, weighted by occurrence count
    pub resample_transitions: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 1500,
            exploration: 1.41,
            resample_transitions: true,
        }
    }
}

impl MctsConfig {
    /// Create a new config with the specified number of iterations.
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Default::default()
        }
    }

    /// Replace the exploration constant.
    pub fn exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    /// Replay observed outcomes instead of performing transitions during
    /// descent. Useful when `perform` is expensive.
    pub fn replay_outcomes(mut self) -> Self {
        self.resample_transitions = false;
        self
    }
}
