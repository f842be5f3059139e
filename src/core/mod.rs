//! Runtime core: the supervision tree and its process-level driver.
//!
//! Internal modules:
//! - [`node`]: tree vertices, scheduling, the stop and wait protocols;
//! - [`hooks`]: per-node stop/done callback lists;
//! - [`supervisor`]: root creation, fault log, termination watch, finalizers;
//! - [`builder`]/[`config`]: supervisor construction;
//! - [`shutdown`]: cross-platform termination signal handling.

mod builder;
mod config;
mod hooks;
mod node;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use hooks::{HookFn, Hooks};
pub use node::Node;
pub use shutdown::wait_for_shutdown_signal;
pub use supervisor::{ExitStatus, Supervisor};
