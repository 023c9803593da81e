//! Grid maze with a single goal cell.
//!
//! The agent starts in the top-left corner of a square grid and moves in
//! four directions. Moves into a wall leave it in place. Every arrival costs
//! -1 except arriving on the goal (bottom-right corner), which pays 10.
//! By default the goal is not terminal, so the best plan is to walk to the
//! goal on a shortest path and keep bumping into the wall there.
//!
//! ```text
//! S . .
//! . . .
//! . . G
//! ```
//!
//! A slippery maze turns a move into one of the two perpendicular moves
//! with the configured probability, which makes transitions stochastic.

use gmcts_core::State;
use rand::{Rng, RngCore};
use std::fmt;

/// Reward for arriving on the goal cell.
pub const GOAL_REWARD: f64 = 10.0;

/// Reward for arriving anywhere else.
pub const STEP_REWARD: f64 = -1.0;

/// A move on the grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    /// Column and row offset of this move.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
        }
    }

    /// The two moves at a right angle to this one.
    pub fn perpendicular(self) -> [Direction; 2] {
        match self {
            Direction::Right | Direction::Left => [Direction::Down, Direction::Up],
            Direction::Down | Direction::Up => [Direction::Right, Direction::Left],
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Up => "up",
        };
        write!(f, "{name}")
    }
}

/// Position in a square maze, plus the rules of that maze.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct Maze {
    x: i32,
    y: i32,
    size: i32,
    terminal_goal: bool,
    slip_percent: u8,
}

impl Maze {
    /// Largest supported side length; keeps all coordinates and distances
    /// within `i32`.
    pub const MAX_SIZE: u32 = 1 << 15;

    /// A `size` x `size` maze with the agent on the start cell.
    ///
    /// # Panics
    /// Panics if `size` is zero or larger than [`Maze::MAX_SIZE`].
    pub fn new(size: u32) -> Self {
        assert!(
            (1..=Self::MAX_SIZE).contains(&size),
            "maze size must be between 1 and {}, got {size}",
            Self::MAX_SIZE
        );
        let size = i32::try_from(size).unwrap_or(i32::MAX);
        Self {
            x: 0,
            y: 0,
            size,
            terminal_goal: false,
            slip_percent: 0,
        }
    }

    /// End the episode once the goal is reached.
    pub fn with_terminal_goal(mut self) -> Self {
        self.terminal_goal = true;
        self
    }

    /// Slip sideways with the given probability (in percent, capped at 100).
    pub fn with_slip(mut self, percent: u8) -> Self {
        self.slip_percent = percent.min(100);
        self
    }

    /// Same maze, agent moved to `(x, y)` (clamped to the grid).
    pub fn at(&self, x: i32, y: i32) -> Self {
        Self {
            x: x.clamp(0, self.size - 1),
            y: y.clamp(0, self.size - 1),
            ..self.clone()
        }
    }

    /// Current `(x, y)` of the agent.
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// The bottom-right cell.
    pub fn goal(&self) -> (i32, i32) {
        (self.size - 1, self.size - 1)
    }

    pub fn at_goal(&self) -> bool {
        self.position() == self.goal()
    }

    /// Moves needed to reach the goal from here.
    pub fn distance_to_goal(&self) -> i32 {
        let (gx, gy) = self.goal();
        (gx - self.x) + (gy - self.y)
    }

    fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.at(self.x + dx, self.y + dy)
    }
}

impl State for Maze {
    type Action = Direction;

    fn actions(&self) -> Vec<Direction> {
        if self.is_terminal() {
            Vec::new()
        } else {
            Direction::ALL.to_vec()
        }
    }

    fn perform(&self, action: &Direction, rng: &mut dyn RngCore) -> Self {
        if self.slip_percent > 0 && rng.gen_range(0..100u8) < self.slip_percent {
            let sideways = action.perpendicular();
            self.step(sideways[rng.gen_range(0..sideways.len())])
        } else {
            self.step(*action)
        }
    }

    fn reward(&self, _parent: &Self, _action: &Direction) -> f64 {
        if self.at_goal() {
            GOAL_REWARD
        } else {
            STEP_REWARD
        }
    }

    fn is_terminal(&self) -> bool {
        self.terminal_goal && self.at_goal()
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size {
            for x in 0..self.size {
                let c = if (x, y) == self.position() {
                    'A'
                } else if (x, y) == self.goal() {
                    'G'
                } else {
                    '.'
                };
                write!(f, "{c}")?;
                if x < self.size - 1 {
                    write!(f, " ")?;
                }
            }
            if y < self.size - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
