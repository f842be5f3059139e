//! # nodevisor
//!
//! **Nodevisor** runs a process as a tree of supervised units of work.
//!
//! Every unit of work is a [`Runner`]. When scheduled it gets its own [`Node`]: a handle
//! it uses to schedule more runners below itself, to promote itself to background, to
//! install stop/done hooks and to raise faults. A [`Supervisor`] owns the root node and
//! tears the whole tree down, in order, on natural completion, on the first fault or on
//! a termination signal.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                         ┌───────────────────────────────┐
//!                         │  Supervisor                   │
//!                         │  - fault log (first → stop)   │
//!                         │  - termination watch          │
//!                         │  - finalizers                 │
//!                         └──────────────┬────────────────┘
//!                                        ▼
//!                                  ┌───────────┐
//!                                  │ Node app  │ (root)
//!                                  └─────┬─────┘
//!                                        ▼
//!                                  ┌───────────┐
//!                                  │ Node app.1│ (root runner)
//!                                  └─────┬─────┘
//!                        ┌───────────────┼───────────────┐
//!                        ▼               ▼               ▼
//!                 ┌────────────┐  ┌────────────┐  ┌────────────┐
//!                 │ app.1.1    │  │ app.1.2    │  │ app.1.3    │
//!                 │ (blocking) │  │ (parallel) │  │ (ticker)   │
//!                 └────────────┘  └────────────┘  └────────────┘
//!
//!   faults:  child stream ──► parent stream ──► ... ──► root stream ──► fault log
//!   events:  every node ──► Bus ──► SubscriberSet ──► Subscribe::on_event
//! ```
//!
//! ### Lifecycle
//! ```text
//! node.run(ctx, [r1, r2])
//!   ├─► r1 runs on app.1.1; caller waits for it (or until it calls parallel())
//!   └─► r2 runs on app.1.2; same
//!
//! shutdown (natural completion | first fault | SIGINT/SIGTERM/SIGQUIT):
//!   stop(root)
//!     └─► children most recent first, each subtree fully
//!           └─► stop hooks (last registered first) → wait for body → close faults
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                  |
//! |-------------------|-------------------------------------------------------------|-------------------------------------|
//! | **Tree**          | Schedule runners, background promotion, stop/done hooks.    | [`Node`], [`Hooks`]                 |
//! | **Runners**       | Define units of work as trait impls or closures.            | [`Runner`], [`RunnerFn`]            |
//! | **Supervision**   | Run the tree until completion, fault or signal.             | [`Supervisor`], [`ExitStatus`]      |
//! | **Errors**        | Typed faults for bodies and hooks.                          | [`Fault`], [`Abort`]                |
//! | **Subscriber API**| Observe node lifecycle events.                              | [`Subscribe`], [`Event`]            |
//! | **Tickers**       | Periodic background work with linear/exponential waits.     | [`tick::Ticker`]                    |
//! | **Probes**        | Startup/readiness/liveness sensors with JSON reports.       | [`probe::Sensor`], [`probe::Mode`]  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use nodevisor::{Node, RunnerFn};
//!
//! fn main() {
//!     nodevisor::run("app", RunnerFn::arc(|ctx: CancellationToken, node: Node| async move {
//!         let db = RunnerFn::arc(|_ctx: CancellationToken, node: Node| async move {
//!             node.on().stop(|| {
//!                 println!("db closed");
//!                 Ok(())
//!             });
//!             Ok(())
//!         });
//!         let server = RunnerFn::arc(|_ctx: CancellationToken, node: Node| async move {
//!             node.parallel();
//!             node.stopping().cancelled().await;
//!             Ok(())
//!         });
//!         node.run(&ctx, [db, server]).await;
//!         Ok(())
//!     }));
//! }
//! ```
mod core;
mod error;
mod events;
mod runners;
mod subscribers;

pub mod probe;
pub mod tick;

// ---- Public re-exports ----

pub use crate::core::{
    ExitStatus, HookFn, Hooks, Node, Supervisor, SupervisorBuilder, SupervisorConfig,
    wait_for_shutdown_signal,
};
pub use error::{Abort, AbortValue, BoxError, CleanupFault, Fault, HookKind, RuntimeFault};
pub use events::{Bus, Event, EventKind};
pub use runners::{Runner, RunnerFn, RunnerRef};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

/// Runs `runner` under a root node named `name` with the default configuration,
/// then exits the process: `0` on success, `1` on failure.
pub fn run(name: &str, runner: RunnerRef) -> ! {
    Supervisor::builder(SupervisorConfig::default())
        .build()
        .run_blocking(name, runner)
}
