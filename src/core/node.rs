//! # Node: one vertex of the supervision tree.
//!
//! A [`Node`] tracks one runner invocation. It owns its children, its one-shot signals
//! (completion, stop trigger, background), its fault stream and its stop/done hooks.
//!
//! ## Scheduling
//! ```text
//! node.run(ctx, [r1, r2])
//!   for each runner (in order):
//!     ├─► refuse if node is errored, finished or stopped
//!     ├─► child = "<name>.<n>"          (1-based position)
//!     ├─► spawn forwarder: child faults ──► node faults
//!     ├─► spawn body: runner.run(ctx, child)
//!     │      └─► fault? → RuntimeFault on child stream
//!     │      └─► finished → done hooks → completion
//!     └─► wait: completion | background   (whichever first)
//! ```
//!
//! ## Teardown
//! ```text
//! stop(node)
//!   ├─► stopped = true, stop trigger fires
//!   ├─► stop(children), most recent first, each subtree fully
//!   ├─► stop hooks (last registered first)
//!   ├─► wait for completion       (a stop hook is expected to unblock the body)
//!   ├─► close fault stream, join forwarder/body tasks
//!   └─► done
//! ```
//!
//! ## Rules
//! - `errored` on a node implies `errored` on every ancestor.
//! - Children are append-only; insertion order = scheduling order.
//! - Every flag is monotonic (false → true once).
//! - The parent link is a `Weak`; ownership only flows parent → children.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::hooks::Hooks;
use crate::error::{
    Abort, AbortValue, BoxError, CleanupFault, Fault, HookKind, RuntimeFault, unwrap_abort,
};
use crate::events::{Bus, Event, EventKind};
use crate::runners::RunnerRef;

/// Receiving end of a node's fault stream.
pub(crate) type FaultReceiver = mpsc::UnboundedReceiver<Fault>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Internal node state shared by the handle, its parent and its helper tasks.
pub(crate) struct NodeInner {
    name: String,
    parent: Weak<NodeInner>,
    children: Mutex<Vec<Arc<NodeInner>>>,

    finished: AtomicBool,
    stopped: AtomicBool,
    errored: AtomicBool,
    promoted: AtomicBool,
    done: AtomicBool,

    /// Fires once the body has returned (or faulted) and done hooks have run.
    completion: CancellationToken,
    /// Fires when teardown of this node starts.
    stop_trigger: CancellationToken,
    /// Fires when the node promotes itself to background.
    background: CancellationToken,

    /// Sending side of the fault stream; `None` once closed.
    faults: Mutex<Option<mpsc::UnboundedSender<Fault>>>,
    /// Forwarder and body tasks joined at the end of teardown.
    helpers: Mutex<Vec<JoinHandle<()>>>,

    hooks: Hooks,
    bus: Bus,
}

impl NodeInner {
    fn new(
        name: String,
        parent: Weak<NodeInner>,
        bus: Bus,
    ) -> (Arc<Self>, FaultReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Self {
            name,
            parent,
            children: Mutex::new(Vec::new()),
            finished: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            errored: AtomicBool::new(false),
            promoted: AtomicBool::new(false),
            done: AtomicBool::new(false),
            completion: CancellationToken::new(),
            stop_trigger: CancellationToken::new(),
            background: CancellationToken::new(),
            faults: Mutex::new(Some(tx)),
            helpers: Mutex::new(Vec::new()),
            hooks: Hooks::default(),
            bus,
        });
        (inner, rx)
    }

    /// Creates a root node. The caller owns the root's fault stream.
    pub(crate) fn root(name: &str, bus: Bus) -> (Arc<Self>, FaultReceiver) {
        Self::new(name.to_string(), Weak::new(), bus)
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn is_root(&self) -> bool {
        self.parent.strong_count() == 0
    }

    fn publish(&self, kind: EventKind) {
        self.bus
            .publish(Event::new(kind).with_node(self.name.as_str()));
    }

    /// Pushes a fault onto this node's stream unless the stream is already closed.
    fn push_fault(&self, fault: Fault) {
        if let Some(tx) = lock(&self.faults).as_ref() {
            let _ = tx.send(fault);
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        lock(&self.helpers).push(handle);
    }

    fn child_at(&self, index: usize) -> Option<Arc<NodeInner>> {
        lock(&self.children).get(index).cloned()
    }

    /// Marks this node and every ancestor as errored.
    fn mark_errored(&self) {
        self.errored.store(true, Ordering::SeqCst);
        let mut parent = self.parent.upgrade();
        while let Some(p) = parent {
            p.errored.store(true, Ordering::SeqCst);
            parent = p.parent.upgrade();
        }
    }

    /// Allocates a child, starts its body and waits until it completes or goes to background.
    async fn schedule(self: &Arc<Self>, ctx: &CancellationToken, runner: RunnerRef) {
        let (child, faults) = {
            let mut children = lock(&self.children);
            if self.errored.load(Ordering::SeqCst)
                || self.finished.load(Ordering::SeqCst)
                || self.stopped.load(Ordering::SeqCst)
            {
                tracing::debug!(node = %self.name, "scheduling refused");
                return;
            }
            let name = format!("{}.{}", self.name, children.len() + 1);
            let (child, faults) = NodeInner::new(name, Arc::downgrade(self), self.bus.clone());
            children.push(Arc::clone(&child));
            (child, faults)
        };

        let forwarder = tokio::spawn(forward_faults(faults, Arc::clone(self)));
        child.track(forwarder);
        child.publish(EventKind::NodeScheduled);

        let body = tokio::spawn(drive(Arc::clone(&child), runner, ctx.clone()));
        child.track(body);

        tokio::select! {
            _ = child.completion.cancelled() => {}
            _ = child.background.cancelled() => {}
        }
    }

    /// Marks the body as returned. Scheduling checks this flag under the same lock.
    fn finish(&self) {
        let _children = lock(&self.children);
        self.finished.store(true, Ordering::SeqCst);
    }

    /// Runs every hook of `kind`, converting failures into cleanup faults.
    fn run_hooks(&self, kind: HookKind) {
        for hook in self.hooks.ordered(kind) {
            let (cause, stack): (BoxError, String) =
                match panic::catch_unwind(AssertUnwindSafe(|| hook())) {
                    Ok(Ok(())) => continue,
                    Ok(Err(err)) => unwrap_abort(err),
                    Err(payload) => (
                        Box::new(AbortValue::from_panic(payload)),
                        std::backtrace::Backtrace::force_capture().to_string(),
                    ),
                };
            self.bus.publish(
                Event::new(EventKind::HookFaulted)
                    .with_node(self.name.as_str())
                    .with_reason(format!("{kind}: {cause}")),
            );
            self.push_fault(CleanupFault::new(&self.name, kind, cause, stack).into());
        }
    }

    /// Tears down this node's subtree, then the node itself.
    pub(crate) fn stop(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move {
            // Teardown runs once; the supervisor and the parent cascade are the only callers.
            if self.stopped.swap(true, Ordering::SeqCst) {
                return;
            }
            self.stop_trigger.cancel();
            self.publish(EventKind::NodeStopping);

            let children: Vec<Arc<NodeInner>> = lock(&self.children).clone();
            for child in children.into_iter().rev() {
                child.stop().await;
            }

            self.run_hooks(HookKind::Stop);
            self.completion.cancelled().await;

            drop(lock(&self.faults).take());
            let helpers = std::mem::take(&mut *lock(&self.helpers));
            for handle in helpers {
                let _ = handle.await;
            }

            self.done.store(true, Ordering::SeqCst);
            self.publish(EventKind::NodeStopped);
        }
        .boxed()
    }

    /// Resolves once every descendant and the node itself have completed.
    ///
    /// The root has no body, so it fires its own completion once its children are done;
    /// that is how natural completion of the whole tree is detected.
    pub(crate) fn wait(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move {
            let mut next = 0;
            loop {
                while let Some(child) = self.child_at(next) {
                    child.wait().await;
                    next += 1;
                }
                if self.is_root() {
                    self.completion.cancel();
                }
                self.completion.cancelled().await;
                // Children scheduled while we were waiting on the last one.
                if self.child_at(next).is_none() {
                    break;
                }
            }
        }
        .boxed()
    }
}

/// Relays a child's faults into its parent's stream until the child's stream closes.
async fn forward_faults(mut faults: FaultReceiver, parent: Arc<NodeInner>) {
    while let Some(fault) = faults.recv().await {
        parent.push_fault(fault);
    }
}

/// Body wrapper: runs the runner, converts aborts and panics into runtime faults,
/// then finishes the node (done hooks, completion).
async fn drive(node: Arc<NodeInner>, runner: RunnerRef, ctx: CancellationToken) {
    let handle = Node {
        inner: Arc::clone(&node),
    };
    let outcome = AssertUnwindSafe(runner.run(ctx, handle))
        .catch_unwind()
        .await;

    let fault = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(abort)) => {
            let (cause, stack) = abort.into_parts();
            Some(RuntimeFault::new(&node.name, cause, stack))
        }
        Err(payload) => Some(RuntimeFault::new(
            &node.name,
            Box::new(AbortValue::from_panic(payload)),
            std::backtrace::Backtrace::force_capture().to_string(),
        )),
    };
    if let Some(fault) = fault {
        // A panicking body never went through `Node::error`.
        node.mark_errored();
        node.bus.publish(
            Event::new(EventKind::NodeFaulted)
                .with_node(node.name.as_str())
                .with_reason(fault.to_string()),
        );
        node.push_fault(fault.into());
    }

    node.finish();
    node.publish(EventKind::NodeFinished);
    node.run_hooks(HookKind::Done);
    node.completion.cancel();
}

/// # Handle given to a runner body.
///
/// Cheap to clone; every clone refers to the same node.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use nodevisor::{Node, RunnerFn};
///
/// let server = RunnerFn::arc(|_ctx: CancellationToken, node: Node| async move {
///     node.parallel();
///
///     let shutdown = CancellationToken::new();
///     let trigger = shutdown.clone();
///     node.on().stop(move || {
///         trigger.cancel();
///         Ok(())
///     });
///
///     shutdown.cancelled().await;
///     Ok(())
/// });
/// # let _ = server;
/// ```
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    pub(crate) fn from_inner(inner: Arc<NodeInner>) -> Self {
        Self { inner }
    }

    /// Hierarchical name, e.g. `app.1.2`.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Runs the given runners in order as children of this node.
    ///
    /// Each call blocks until the child's body has finished or the child promoted itself
    /// with [`Node::parallel`]. Scheduling is silently refused once this node is errored,
    /// finished or being stopped.
    pub async fn run<I>(&self, ctx: &CancellationToken, runners: I)
    where
        I: IntoIterator<Item = RunnerRef>,
        I::IntoIter: Send,
    {
        for runner in runners {
            self.inner.schedule(ctx, runner).await;
        }
    }

    /// Promotes this node to background: the caller of `run` stops waiting for it.
    ///
    /// Idempotent; only the first call has an effect.
    pub fn parallel(&self) {
        if self.inner.promoted.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.background.cancel();
        self.inner.publish(EventKind::NodeBackground);
    }

    /// Returns the stop/done hook lists of this node.
    pub fn on(&self) -> &Hooks {
        &self.inner.hooks
    }

    /// Raises `err` as a fault of this node.
    ///
    /// Marks this node and every ancestor as errored and returns the [`Abort`] the body
    /// should propagate with `?`. Inside a stop or done hook, propagating it reports a
    /// [`CleanupFault`] and the next hook still runs.
    ///
    /// A no-op (returns `Ok(())`) once teardown of this node has completed.
    pub fn error<E>(&self, err: E) -> Result<(), Abort>
    where
        E: Into<BoxError>,
    {
        if self.inner.done.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.mark_errored();
        Err(Abort::new(err.into()))
    }

    /// Raises the error held by `res`, if any. `Ok(())` is a no-op.
    pub fn check<E>(&self, res: Result<(), E>) -> Result<(), Abort>
    where
        E: Into<BoxError>,
    {
        match res {
            Ok(()) => Ok(()),
            Err(err) => self.error(err),
        }
    }

    /// Token cancelled when teardown of this node starts.
    ///
    /// An alternative to a stop hook for bodies that prefer to `select!` on shutdown.
    pub fn stopping(&self) -> CancellationToken {
        self.inner.stop_trigger.clone()
    }

    /// True once this node or one of its descendants raised a fault.
    pub fn is_errored(&self) -> bool {
        self.inner.errored.load(Ordering::SeqCst)
    }

    /// True once the runner body has returned or faulted.
    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::SeqCst)
    }

    /// True once teardown of this node has started.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.inner.name)
            .field("errored", &self.is_errored())
            .field("finished", &self.is_finished())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
