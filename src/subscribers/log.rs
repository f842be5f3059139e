//! # LogWriter - simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [scheduled] node=app.1
//! [background] node=app.1.2
//! [finished] node=app.1.1
//! [faulted] node=app.1.1 err="runtime error: boom"
//! [stopping] node=app
//! [stopped] node=app
//! [shutdown-requested] node=app reason=fault
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let node = e.node.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::NodeScheduled => println!("[scheduled] node={node}"),
            EventKind::NodeBackground => println!("[background] node={node}"),
            EventKind::NodeFinished => println!("[finished] node={node}"),
            EventKind::NodeFaulted => println!("[faulted] node={node} err={reason:?}"),
            EventKind::HookFaulted => println!("[hook-faulted] node={node} err={reason:?}"),
            EventKind::NodeStopping => println!("[stopping] node={node}"),
            EventKind::NodeStopped => println!("[stopped] node={node}"),
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested] node={node} reason={reason}");
            }
            EventKind::FinalizerFailed => println!("[finalizer-failed] err={reason:?}"),
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={node} reason={reason}");
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={node} info={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
