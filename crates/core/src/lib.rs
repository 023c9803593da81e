//! gmcts core - domain model contract and common types
//!
//! This crate provides the [`State`] trait that any decision process must
//! implement to be searched by the `gmcts` engine, plus the error taxonomy
//! shared by the engine and its callers.
//!
//! # Types
//!
//! - [`State`] - Trait for domain states and their actions
//! - [`SearchError`] - Contract violations surfaced by the engine

mod error;
mod state;

pub use error::{Result, SearchError};
pub use state::State;
