//! # Lifecycle events emitted by the supervision tree.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Node events**: scheduling, background promotion, completion, faults, teardown
//! - **Process events**: shutdown requests and final-cleanup failures
//! - **Subscriber events**: overflow and panics inside event subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, node name and reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use nodevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::NodeFaulted)
//!     .with_node("app.1")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::NodeFaulted);
//! assert_eq!(ev.node.as_deref(), Some("app.1"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Node events ===
    /// A runner was scheduled as a new child node.
    ///
    /// Sets: `node` (child name).
    NodeScheduled,

    /// A node promoted itself to background; its scheduler stopped waiting.
    ///
    /// Sets: `node`.
    NodeBackground,

    /// A runner body returned or faulted.
    ///
    /// Sets: `node`.
    NodeFinished,

    /// A runner body aborted (error or panic).
    ///
    /// Sets: `node`, `reason` (fault message).
    NodeFaulted,

    /// A stop or done hook aborted.
    ///
    /// Sets: `node`, `reason` (hook kind and fault message).
    HookFaulted,

    /// Teardown of a node started.
    ///
    /// Sets: `node`.
    NodeStopping,

    /// Teardown of a node completed: subtree stopped, hooks run, fault stream closed.
    ///
    /// Sets: `node`.
    NodeStopped,

    // === Process events ===
    /// Tree-wide stop requested by a fault or an external termination signal.
    ///
    /// Sets: `node` (root name), `reason` ("fault" or "signal").
    ShutdownRequested,

    /// A final-cleanup callback failed.
    ///
    /// Sets: `reason` (error message).
    FinalizerFailed,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `node` (subscriber name), `reason`.
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `node` (subscriber name), `reason` (panic info).
    SubscriberPanicked,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Hierarchical node name (or subscriber name for subscriber events).
    pub node: Option<Arc<str>>,
    /// Human-readable reason (fault messages, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            node: None,
            reason: None,
        }
    }

    /// Attaches a node name.
    #[inline]
    pub fn with_node(mut self, node: impl Into<Arc<str>>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_node(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_node(subscriber)
            .with_reason(info)
    }

    /// True for events reporting a fault (body or hook).
    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(self.kind, EventKind::NodeFaulted | EventKind::HookFaulted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::NodeScheduled);
        let b = Event::new(EventKind::NodeFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn subscriber_events_carry_name_and_reason() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.node.as_deref(), Some("metrics"));
        assert_eq!(ev.reason.as_deref(), Some("full"));
        assert!(!ev.is_fault());

        assert!(Event::new(EventKind::HookFaulted).is_fault());
    }
}
