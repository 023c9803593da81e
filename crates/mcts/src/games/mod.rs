//! Small domains used to validate and demonstrate the search.
//!
//! These are deliberately tiny so that the optimal plan is known and
//! tests can check that the search finds it.

pub mod maze;

pub use maze::{Direction, Maze};
