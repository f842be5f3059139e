//! # Periodic runner.
//!
//! [`Ticker`] is a [`Runner`] that calls a tick function repeatedly, sleeping the wait
//! given by its [`Backoff`] before each call.
//!
//! ```text
//! run(ctx, node)
//!   ├─► node.parallel()                      (caller of run() resumes immediately)
//!   ├─► stop hook: cancel internal token
//!   └─► loop:
//!         ├─ internal token cancelled?   → return
//!         ├─ count + 1 > until (if set)  → return
//!         ├─ sleep(backoff.wait(count + 1))   (cancellable)
//!         └─ f(token, Tick { count, tick, started, .. })?
//! ```
//!
//! The internal token is a child of the caller's token, so cancelling `ctx` also ends
//! the ticker. A tick function returning `Err` ends it with a runtime fault.

use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::{Hooks, Node};
use crate::error::{Abort, BoxError};
use crate::runners::{Runner, RunnerRef};
use crate::tick::Backoff;

/// View of a running ticker handed to the tick function.
#[derive(Clone, Debug)]
pub struct Tick {
    node: Node,
    tick: SystemTime,
    started: SystemTime,
    count: u32,
    stop: CancellationToken,
}

impl Tick {
    /// Name of the ticker's node.
    pub fn name(&self) -> &str {
        self.node.name()
    }

    /// Time of the current tick.
    pub fn tick(&self) -> SystemTime {
        self.tick
    }

    /// Time the ticker started.
    pub fn started(&self) -> SystemTime {
        self.started
    }

    /// Number of the current tick (1-based).
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Ends the ticker after the current tick.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Hooks of the ticker's node.
    pub fn on(&self) -> &Hooks {
        self.node.on()
    }

    /// Raises `err` on the ticker's node. See [`Node::error`].
    pub fn error<E>(&self, err: E) -> Result<(), Abort>
    where
        E: Into<BoxError>,
    {
        self.node.error(err)
    }

    /// The ticker's node.
    pub fn node(&self) -> &Node {
        &self.node
    }
}

/// Runner calling `f` on every tick.
pub struct Ticker<B, F> {
    backoff: B,
    until: u32,
    f: F,
}

impl<B, F, Fut> Ticker<B, F>
where
    B: Backoff,
    F: Fn(CancellationToken, Tick) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Abort>> + Send + 'static,
{
    /// Creates an unlimited ticker.
    pub fn new(backoff: B, f: F) -> Self {
        Self {
            backoff,
            until: 0,
            f,
        }
    }

    /// Limits the ticker to `n` ticks; `0` means unlimited.
    pub fn until(mut self, n: u32) -> Self {
        self.until = n;
        self
    }

    /// Returns the ticker as a shared runner handle.
    pub fn arc(self) -> RunnerRef {
        Arc::new(self)
    }
}

#[async_trait]
impl<B, F, Fut> Runner for Ticker<B, F>
where
    B: Backoff,
    F: Fn(CancellationToken, Tick) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Abort>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken, node: Node) -> Result<(), Abort> {
        node.parallel();

        let stop = ctx.child_token();
        let hook = stop.clone();
        node.on().stop(move || {
            hook.cancel();
            Ok(())
        });

        let started = SystemTime::now();
        let mut count: u32 = 0;
        loop {
            if stop.is_cancelled() {
                break;
            }
            let Some(next) = count.checked_add(1) else {
                break;
            };
            if self.until > 0 && next > self.until {
                break;
            }

            let wait = self.backoff.wait(next);
            if !wait.is_zero() {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {}
                }
            }

            count = next;
            let tick = Tick {
                node: node.clone(),
                tick: SystemTime::now(),
                started,
                count,
                stop: stop.clone(),
            };
            (self.f)(stop.clone(), tick).await?;
        }
        tracing::debug!(node = node.name(), ticks = count, "ticker ended");
        Ok(())
    }
}
