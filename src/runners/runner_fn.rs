//! # Function-backed runner (`RunnerFn`)
//!
//! [`RunnerFn`] wraps a closure `F: Fn(CancellationToken, Node) -> Fut`, producing the
//! body future when the runner is scheduled.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use nodevisor::{Node, RunnerFn, RunnerRef};
//!
//! let r: RunnerRef = RunnerFn::arc(|_ctx: CancellationToken, node: Node| async move {
//!     println!("hello from {}", node.name());
//!     Ok(())
//! });
//! # let _ = r;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::Node;
use crate::error::Abort;
use crate::runners::runner::{Runner, RunnerRef};

/// Function-backed runner implementation.
pub struct RunnerFn<F> {
    f: F,
}

impl<F, Fut> RunnerFn<F>
where
    F: Fn(CancellationToken, Node) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Abort>> + Send + 'static,
{
    /// Creates a new function-backed runner.
    ///
    /// Prefer [`RunnerFn::arc`] when you immediately need a [`RunnerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the runner and returns it as a shared handle (`Arc<dyn Runner>`).
    pub fn arc(f: F) -> RunnerRef {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Runner for RunnerFn<F>
where
    F: Fn(CancellationToken, Node) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Abort>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken, node: Node) -> Result<(), Abort> {
        (self.f)(ctx, node).await
    }
}
