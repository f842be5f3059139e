//! Fault types used by the supervision tree.
//!
//! Every abort inside a runner body or a hook is caught at the node that raised it and
//! converted into a [`Fault`] before it crosses a node boundary:
//!
//! - [`RuntimeFault`] - a runner body aborted (via [`Node::error`](crate::Node::error) or a panic).
//! - [`CleanupFault`] - a stop or done hook aborted.
//! - [`AbortValue`] - wraps a panic payload so it can be carried as a regular cause.
//!
//! [`Abort`] is the control value a runner returns (usually with `?`) to leave its body early.
//! Both fault types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;

use thiserror::Error;

/// Boxed error used as the cause of every fault.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Non-local exit from a runner body.
///
/// Returned by [`Node::error`](crate::Node::error) and [`Node::check`](crate::Node::check).
/// A runner propagates it with `?`; the node's body wrapper is the only place that turns it
/// into a [`RuntimeFault`]. Inside a hook, `?` converts it into a [`BoxError`] and the hook
/// runner unwraps it back into its cause.
///
/// An `Abort` cannot be built outside the crate: the only way to raise one is through a node,
/// which also marks the node and its ancestors as errored.
#[derive(Error, Debug)]
#[error("{cause}")]
pub struct Abort {
    cause: BoxError,
    stack: String,
}

impl Abort {
    pub(crate) fn new(cause: BoxError) -> Self {
        Self {
            cause,
            stack: Backtrace::force_capture().to_string(),
        }
    }

    /// Returns the error that caused the abort.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    pub(crate) fn into_parts(self) -> (BoxError, String) {
        (self.cause, self.stack)
    }
}

/// Non-error abort payload (a panic) carried as a regular cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("caught panic: {payload}")]
pub struct AbortValue {
    /// Rendered panic payload.
    pub payload: String,
}

impl AbortValue {
    /// Renders a payload returned by `catch_unwind`.
    ///
    /// `&str` and `String` payloads (what `panic!` produces) are kept verbatim; a
    /// [`BoxError`] raised with `panic_any` is rendered through its `Display`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<String>() {
            Ok(s) => *s,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(s) => (*s).to_string(),
                Err(payload) => match payload.downcast::<BoxError>() {
                    Ok(err) => err.to_string(),
                    Err(_) => "opaque panic payload".to_string(),
                },
            },
        };
        Self { payload }
    }
}

/// Kind of hook that produced a [`CleanupFault`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Hook registered with [`Hooks::stop`](crate::Hooks::stop).
    Stop,
    /// Hook registered with [`Hooks::done`](crate::Hooks::done).
    Done,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::Stop => f.write_str("stop"),
            HookKind::Done => f.write_str("done"),
        }
    }
}

/// A runner body aborted.
#[derive(Error, Debug)]
#[error("runtime error: {cause}")]
pub struct RuntimeFault {
    /// Name of the node whose body aborted.
    pub node: String,
    /// What aborted the body.
    #[source]
    pub cause: BoxError,
    /// Rendered backtrace captured where the abort was raised (or caught, for panics).
    pub stack: String,
}

impl RuntimeFault {
    pub(crate) fn new(node: &str, cause: BoxError, stack: String) -> Self {
        Self {
            node: node.to_string(),
            cause,
            stack,
        }
    }
}

/// A stop or done hook aborted.
#[derive(Error, Debug)]
#[error("cleanup error: {cause}")]
pub struct CleanupFault {
    /// Name of the node owning the hook.
    pub node: String,
    /// Which hook list the hook belonged to.
    pub hook: HookKind,
    /// What aborted the hook.
    #[source]
    pub cause: BoxError,
    /// Rendered backtrace captured where the abort was raised (or caught, for panics).
    pub stack: String,
}

impl CleanupFault {
    pub(crate) fn new(node: &str, hook: HookKind, cause: BoxError, stack: String) -> Self {
        Self {
            node: node.to_string(),
            hook,
            cause,
            stack,
        }
    }
}

/// # Unrecovered failure travelling up the fault stream.
///
/// Faults flow child → parent until they reach the supervisor, which logs them and
/// triggers a tree-wide stop on the first one.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Fault {
    /// A runner body aborted.
    #[error(transparent)]
    Runtime(#[from] RuntimeFault),

    /// A hook aborted.
    #[error(transparent)]
    Cleanup(#[from] CleanupFault),
}

impl Fault {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Fault::Runtime(_) => "runtime_fault",
            Fault::Cleanup(f) => match f.hook {
                HookKind::Stop => "cleanup_fault_stop",
                HookKind::Done => "cleanup_fault_done",
            },
        }
    }

    /// Returns a human-readable message with details about the fault.
    pub fn as_message(&self) -> String {
        match self {
            Fault::Runtime(f) => format!("node={} runtime: {}", f.node, f.cause),
            Fault::Cleanup(f) => format!("node={} {} hook: {}", f.node, f.hook, f.cause),
        }
    }

    /// Name of the node where the fault was raised.
    pub fn node(&self) -> &str {
        match self {
            Fault::Runtime(f) => &f.node,
            Fault::Cleanup(f) => &f.node,
        }
    }

    /// The error that caused the fault.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            Fault::Runtime(f) => f.cause.as_ref(),
            Fault::Cleanup(f) => f.cause.as_ref(),
        }
    }

    /// Rendered backtrace captured with the fault.
    pub fn stack(&self) -> &str {
        match self {
            Fault::Runtime(f) => &f.stack,
            Fault::Cleanup(f) => &f.stack,
        }
    }

    /// True if the cause is a caught panic.
    pub fn is_panic(&self) -> bool {
        self.cause().downcast_ref::<AbortValue>().is_some()
    }
}

/// Splits an error returned by a hook: an [`Abort`] raised through a node is unwrapped back
/// into its cause and stack; any other error gets a stack captured here.
pub(crate) fn unwrap_abort(err: BoxError) -> (BoxError, String) {
    match err.downcast::<Abort>() {
        Ok(abort) => abort.into_parts(),
        Err(err) => (err, Backtrace::force_capture().to_string()),
    }
}
