//! Lifecycle events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: every node (scheduling, background, finish, faults, teardown),
//!   the supervisor (shutdown requests, finalizer failures) and `SubscriberSet` workers.
//! - **Consumers**: the supervisor's event listener, which fans out to a `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
