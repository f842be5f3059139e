//! # Supervisor: drives one supervision tree from start to process exit.
//!
//! The [`Supervisor`] owns the event bus, the subscriber list and the process-wide
//! finalizers. A run creates the root [`Node`], schedules the root runner on it and
//! tears the whole tree down on natural completion, on the first fault or on an
//! external termination request.
//!
//! ## High-level architecture
//! ```text
//! run_until(name, runner, shutdown):
//!
//!   event listener:   Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!
//!   root = Node(name)
//!     │
//!     ├─► fault log:  root faults ─► tracing::error!
//!     │                 └─► first fault: status = Failure, shutdown trigger fires
//!     │
//!     ├─► watcher:    first of { natural completion, shutdown trigger, shutdown future }
//!     │                 └─► root.stop()   (always)
//!     │
//!     ├─► root.run(ctx, [runner])
//!     ├─► root.wait()  ─► natural completion fires
//!     ├─► join watcher, join fault log
//!     └─► finalizers (registration order; failures logged, status = Failure)
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use nodevisor::{Node, RunnerFn, Supervisor, SupervisorConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = RunnerFn::arc(|ctx: CancellationToken, node: Node| async move {
//!         let db = RunnerFn::arc(|_ctx: CancellationToken, node: Node| async move {
//!             node.on().stop(|| {
//!                 println!("closing pool");
//!                 Ok(())
//!             });
//!             Ok(())
//!         });
//!         node.run(&ctx, [db]).await;
//!         Ok(())
//!     });
//!
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_finalizer(|| {
//!             println!("flushing");
//!             Ok(())
//!         })
//!         .build();
//!
//!     let status = sup.run("app", app).await;
//!     std::process::exit(sup.config().exit_code(status));
//! }
//! ```

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::core::node::{FaultReceiver, Node, NodeInner};
use crate::core::{SupervisorBuilder, SupervisorConfig, shutdown};
use crate::error::{AbortValue, BoxError};
use crate::events::{Bus, Event, EventKind};
use crate::runners::RunnerRef;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Process-wide cleanup callback run after the tree has stopped.
pub(crate) type Finalizer = Arc<dyn Fn() -> Result<(), BoxError> + Send + Sync>;

/// Outcome of a supervised run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// No fault reached the root and every finalizer succeeded.
    Success,
    /// At least one fault reached the root, or a finalizer failed.
    Failure,
}

impl ExitStatus {
    /// True for [`ExitStatus::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, ExitStatus::Success)
    }
}

/// Owns the lifecycle of a supervision tree.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    finalizers: Vec<Finalizer>,
}

impl Supervisor {
    /// Starts building a supervisor.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        bus: Bus,
        subscribers: Vec<Arc<dyn Subscribe>>,
        finalizers: Vec<Finalizer>,
    ) -> Self {
        Self {
            cfg,
            bus,
            subscribers,
            finalizers,
        }
    }

    /// Returns the configuration this supervisor was built with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Returns the lifecycle event bus.
    ///
    /// Receivers obtained via [`Bus::subscribe`] see every event published after the call.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs `runner` as the only child of a root node named `name` until the tree
    /// completes, a fault reaches the root, or the process receives a termination signal.
    pub async fn run(&self, name: &str, runner: RunnerRef) -> ExitStatus {
        self.run_until(name, runner, shutdown::termination()).await
    }

    /// Like [`Supervisor::run`], with `shutdown` as the external termination source.
    pub async fn run_until<S>(&self, name: &str, runner: RunnerRef, shutdown: S) -> ExitStatus
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let listener_stop = CancellationToken::new();
        let listener = tokio::spawn(event_listener(
            self.bus.subscribe(),
            SubscriberSet::new(self.subscribers.clone(), self.bus.clone()),
            listener_stop.clone(),
        ));

        let (root, faults) = NodeInner::root(name, self.bus.clone());
        let failed = Arc::new(AtomicBool::new(false));
        let trigger = CancellationToken::new();
        let natural = CancellationToken::new();

        let fault_log = tokio::spawn(log_faults(
            faults,
            self.bus.clone(),
            trigger.clone(),
            Arc::clone(&failed),
        ));
        let watcher = tokio::spawn(watch_termination(
            Arc::clone(&root),
            self.bus.clone(),
            shutdown,
            trigger,
            natural.clone(),
        ));

        // Passed through untouched; teardown goes through the stop cascade.
        let ctx = CancellationToken::new();
        Node::from_inner(Arc::clone(&root)).run(&ctx, [runner]).await;
        Arc::clone(&root).wait().await;
        natural.cancel();

        if let Err(err) = watcher.await {
            tracing::error!(error = %err, "termination watcher failed");
            failed.store(true, Ordering::SeqCst);
        }
        if let Err(err) = fault_log.await {
            tracing::error!(error = %err, "fault log failed");
            failed.store(true, Ordering::SeqCst);
        }

        if !self.run_finalizers() {
            failed.store(true, Ordering::SeqCst);
        }

        listener_stop.cancel();
        let _ = listener.await;

        if failed.load(Ordering::SeqCst) {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }

    /// Builds a multi-thread runtime, runs the tree and exits the process with
    /// the code mapped by [`SupervisorConfig::exit_code`].
    pub fn run_blocking(self, name: &str, runner: RunnerRef) -> ! {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(err) => {
                tracing::error!(error = %err, "cannot start async runtime");
                std::process::exit(self.cfg.failure_code);
            }
        };
        let status = runtime.block_on(self.run(name, runner));
        std::process::exit(self.cfg.exit_code(status))
    }

    /// Runs every finalizer in registration order. Returns false if any failed.
    fn run_finalizers(&self) -> bool {
        let mut ok = true;
        for (idx, finalizer) in self.finalizers.iter().enumerate() {
            let reason = match panic::catch_unwind(AssertUnwindSafe(|| finalizer())) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(payload) => AbortValue::from_panic(payload).to_string(),
            };
            tracing::error!(finalizer = idx, reason = reason.as_str(), "finalizer failed");
            self.bus
                .publish(Event::new(EventKind::FinalizerFailed).with_reason(reason));
            ok = false;
        }
        ok
    }
}

/// Forwards bus events to the subscriber set until `stop` fires, then drains what is left.
async fn event_listener(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    stop: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            res = rx.recv() => match res {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = stop.cancelled() => break,
        }
    }
    loop {
        match rx.try_recv() {
            Ok(ev) => set.emit(&ev),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    set.shutdown().await;
}

/// Logs every fault reaching the root; the first one requests shutdown.
async fn log_faults(
    mut faults: FaultReceiver,
    bus: Bus,
    trigger: CancellationToken,
    failed: Arc<AtomicBool>,
) {
    while let Some(fault) = faults.recv().await {
        tracing::error!(
            node = fault.node(),
            label = fault.as_label(),
            stack = fault.stack(),
            "{}",
            fault.as_message()
        );
        if !failed.swap(true, Ordering::SeqCst) {
            bus.publish(
                Event::new(EventKind::ShutdownRequested)
                    .with_node(fault.node())
                    .with_reason("fault"),
            );
            trigger.cancel();
        }
    }
}

/// Stops the root once the tree completes, a fault requests it, or `shutdown` resolves.
async fn watch_termination<S>(
    root: Arc<NodeInner>,
    bus: Bus,
    shutdown: S,
    trigger: CancellationToken,
    natural: CancellationToken,
) where
    S: Future<Output = ()> + Send + 'static,
{
    tokio::select! {
        _ = natural.cancelled() => {
            tracing::debug!(node = root.name(), "tree completed");
        }
        _ = trigger.cancelled() => {
            tracing::debug!(node = root.name(), "stopping after fault");
        }
        _ = shutdown => {
            tracing::debug!(node = root.name(), "termination requested");
            bus.publish(
                Event::new(EventKind::ShutdownRequested)
                    .with_node(root.name())
                    .with_reason("signal"),
            );
        }
    }
    root.stop().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Abort;
    use crate::runners::RunnerFn;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    type Journal = Arc<Mutex<Vec<String>>>;

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn note(j: &Journal, s: impl Into<String>) {
        j.lock().unwrap().push(s.into());
    }

    fn entries(j: &Journal) -> Vec<String> {
        j.lock().unwrap().clone()
    }

    fn supervisor() -> Supervisor {
        Supervisor::builder(SupervisorConfig::default()).build()
    }

    fn never() -> std::future::Pending<()> {
        std::future::pending()
    }

    /// Blocking runner that only installs a stop hook.
    fn with_stop_hook(j: &Journal, tag: &'static str) -> RunnerRef {
        let j = Arc::clone(j);
        RunnerFn::arc(move |_ctx: CancellationToken, node: Node| {
            let j = Arc::clone(&j);
            async move {
                node.on().stop(move || {
                    note(&j, tag);
                    Ok(())
                });
                Ok(())
            }
        })
    }

    /// Background runner blocking until its stop hook fires.
    fn background(j: &Journal, tag: &'static str) -> RunnerRef {
        let j = Arc::clone(j);
        RunnerFn::arc(move |_ctx: CancellationToken, node: Node| {
            let j = Arc::clone(&j);
            async move {
                node.parallel();
                let release = CancellationToken::new();
                let trigger = release.clone();
                node.on().stop(move || {
                    note(&j, tag);
                    trigger.cancel();
                    Ok(())
                });
                release.cancelled().await;
                Ok(())
            }
        })
    }

    fn sequence(children: Vec<RunnerRef>) -> RunnerRef {
        RunnerFn::arc(move |ctx: CancellationToken, node: Node| {
            let children = children.clone();
            async move {
                node.run(&ctx, children).await;
                Ok(())
            }
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn natural_completion_stops_in_reverse_and_succeeds() {
        let j = journal();
        let root = sequence(vec![with_stop_hook(&j, "A-stop"), with_stop_hook(&j, "B-stop")]);

        let status = supervisor().run_until("app", root, never()).await;

        assert_eq!(status, ExitStatus::Success);
        assert_eq!(entries(&j), vec!["B-stop", "A-stop"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn first_fault_stops_whole_tree_and_fails() {
        let j = journal();
        let failing = RunnerFn::arc(|_ctx: CancellationToken, node: Node| async move {
            node.error("db unreachable")?;
            Ok::<_, Abort>(())
        });
        let root = sequence(vec![background(&j, "sibling-stop"), failing]);

        let status = tokio::time::timeout(
            Duration::from_secs(5),
            supervisor().run_until("app", root, never()),
        )
        .await
        .expect("fault must tear the tree down");

        assert_eq!(status, ExitStatus::Failure);
        assert_eq!(entries(&j), vec!["sibling-stop"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn external_termination_stops_background_work() {
        let j = journal();
        let root = sequence(vec![background(&j, "w1"), background(&j, "w2")]);

        let status = supervisor()
            .run_until("app", root, tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(status, ExitStatus::Success);
        assert_eq!(entries(&j), vec!["w2", "w1"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_body_fails_the_run() {
        let root = RunnerFn::arc(|_ctx: CancellationToken, node: Node| async move {
            if node.name() == "app.1" {
                panic!("boom");
            }
            Ok(())
        });

        let status = supervisor().run_until("app", root, never()).await;
        assert_eq!(status, ExitStatus::Failure);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn error_raised_in_stop_hook_fails_the_run() {
        let j = journal();
        let jj = Arc::clone(&j);
        let root = RunnerFn::arc(move |_ctx: CancellationToken, node: Node| {
            let j = Arc::clone(&jj);
            async move {
                let j1 = Arc::clone(&j);
                node.on().stop(move || {
                    note(&j1, "next hook ran");
                    Ok(())
                });
                let h = node.clone();
                node.on().stop(move || {
                    h.error("close failed")?;
                    Ok(())
                });
                Ok(())
            }
        });

        let status = supervisor().run_until("app", root, never()).await;

        assert_eq!(status, ExitStatus::Failure);
        assert_eq!(entries(&j), vec!["next hook ran"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn every_finalizer_runs_and_failures_flip_status() {
        let j = journal();
        let (j1, j2) = (Arc::clone(&j), Arc::clone(&j));
        let sup = Supervisor::builder(SupervisorConfig::default())
            .with_finalizer(move || {
                note(&j1, "first");
                Err("flush failed".into())
            })
            .with_finalizer(|| panic!("finalizer panicked"))
            .with_finalizer(move || {
                note(&j2, "last");
                Ok(())
            })
            .build();

        let root = sequence(vec![]);
        let status = sup.run_until("app", root, never()).await;

        assert_eq!(status, ExitStatus::Failure);
        assert_eq!(entries(&j), vec!["first", "last"]);
    }

    struct Recorder {
        seen: Arc<Mutex<Vec<(EventKind, Option<String>)>>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            let node = ev.node.as_deref().map(str::to_string);
            self.seen.lock().unwrap().push((ev.kind, node));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn subscribers_observe_node_lifecycle() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Recorder {
            seen: Arc::clone(&seen),
        })];
        let sup = Supervisor::builder(SupervisorConfig::default())
            .with_subscribers(subs)
            .build();

        let j = journal();
        let status = sup
            .run_until("app", with_stop_hook(&j, "stop"), never())
            .await;
        assert!(status.is_success());

        let seen = seen.lock().unwrap().clone();
        let for_child: Vec<EventKind> = seen
            .iter()
            .filter(|(_, node)| node.as_deref() == Some("app.1"))
            .map(|(kind, _)| *kind)
            .collect();
        assert_eq!(
            for_child,
            vec![
                EventKind::NodeScheduled,
                EventKind::NodeFinished,
                EventKind::NodeStopping,
                EventKind::NodeStopped,
            ]
        );
        assert!(
            seen.iter()
                .any(|(kind, node)| *kind == EventKind::NodeStopped && node.as_deref() == Some("app"))
        );
    }
}
