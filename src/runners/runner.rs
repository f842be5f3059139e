//! # Runner abstraction.
//!
//! A [`Runner`] is a unit of work scheduled on a [`Node`]. It receives the caller's
//! [`CancellationToken`] and a [`Node`] handle it can use to schedule more runners,
//! promote itself to background, install stop/done hooks and report faults.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::Node;
use crate::error::Abort;

/// # Unit of work in the supervision tree.
///
/// `run` is invoked at most once per scheduled instance, on its own tokio task.
/// Returning `Err(Abort)` (raised through [`Node::error`] / [`Node::check`]) or panicking
/// ends the body with a [`RuntimeFault`](crate::RuntimeFault).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use nodevisor::{Abort, Node, Runner};
///
/// struct Migrate;
///
/// #[async_trait]
/// impl Runner for Migrate {
///     async fn run(&self, _ctx: CancellationToken, node: Node) -> Result<(), Abort> {
///         node.on().stop(|| {
///             println!("closing migration connection");
///             Ok(())
///         });
///         let applied: Result<(), std::io::Error> = Ok(());
///         node.check(applied)?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Runner: Send + Sync + 'static {
    /// Executes the runner body.
    async fn run(&self, ctx: CancellationToken, node: Node) -> Result<(), Abort>;
}

/// Shared handle to a runner.
pub type RunnerRef = Arc<dyn Runner>;
