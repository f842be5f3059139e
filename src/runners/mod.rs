//! # Runner abstractions.
//!
//! - [`Runner`] - trait for implementing units of work in the tree
//! - [`RunnerFn`] - closure-based runner implementation
//! - [`RunnerRef`] - shared reference to a runner (`Arc<dyn Runner>`)

mod runner;
mod runner_fn;

pub use runner::{Runner, RunnerRef};
pub use runner_fn::RunnerFn;
