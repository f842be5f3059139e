//! # Event subscribers for the supervision tree.
//!
//! ```text
//! Node ── publish(Event) ──► Bus ──► supervisor listener ──► SubscriberSet
//!                                                              │
//!                                                    ┌─────────┼─────────┐
//!                                                    ▼         ▼         ▼
//!                                                LogWriter  Metrics   Custom
//! ```
//!
//! Implement [`Subscribe`] to observe node lifecycle events (scheduling, faults,
//! teardown). Subscribers never block the tree: each one gets its own bounded queue.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
