//! # Periodic work on the supervision tree.
//!
//! - [`Ticker`] - background runner calling a function on every tick
//! - [`Tick`] - view of the running ticker given to that function
//! - [`Backoff`], [`LinearBackoff`], [`ExponentialBackoff`] - wait before each tick
//! - [`linear`], [`exponential`] - schedule a ticker as a child of a node
//!
//! A ticker is promoted to background as soon as it starts and ends when its node is
//! stopped, when its tick limit is reached or when the tick function calls [`Tick::stop`].
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use nodevisor::{Node, RunnerFn, tick};
//!
//! let app = RunnerFn::arc(|ctx: CancellationToken, node: Node| async move {
//!     tick::linear(&ctx, &node, Duration::from_secs(1), |_ctx, t| async move {
//!         println!("{} tick #{}", t.name(), t.count());
//!         Ok(())
//!     })
//!     .await;
//!     Ok(())
//! });
//! nodevisor::run("ticker", app);
//! ```

mod backoff;
mod ticker;

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::Node;
use crate::error::Abort;

pub use backoff::{Backoff, ExponentialBackoff, LinearBackoff};
pub use ticker::{Tick, Ticker};

/// Schedules an unlimited ticker waiting `every` before each tick.
pub async fn linear<F, Fut>(ctx: &CancellationToken, node: &Node, every: Duration, f: F)
where
    F: Fn(CancellationToken, Tick) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Abort>> + Send + 'static,
{
    let ticker = Ticker::new(LinearBackoff::new(every), f).arc();
    node.run(ctx, [ticker]).await;
}

/// Schedules a ticker of at most `until` ticks whose wait doubles from `scalar`.
///
/// `until == 0` means unlimited ticks at a constant `scalar` wait.
pub async fn exponential<F, Fut>(
    ctx: &CancellationToken,
    node: &Node,
    until: u32,
    scalar: Duration,
    f: F,
) where
    F: Fn(CancellationToken, Tick) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Abort>> + Send + 'static,
{
    let ticker = if until == 0 {
        Ticker::new(LinearBackoff::new(scalar), f).arc()
    } else {
        Ticker::new(ExponentialBackoff::new(scalar), f)
            .until(until)
            .arc()
    };
    node.run(ctx, [ticker]).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExitStatus, RunnerFn, Supervisor, SupervisorConfig};
    use std::sync::{Arc, Mutex};

    type Journal = Arc<Mutex<Vec<String>>>;

    fn supervisor() -> Supervisor {
        Supervisor::builder(SupervisorConfig::default()).build()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn limited_ticker_completes_naturally() {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let j = Arc::clone(&journal);

        let app = RunnerFn::arc(move |ctx: CancellationToken, node: Node| {
            let j = Arc::clone(&j);
            async move {
                exponential(&ctx, &node, 3, Duration::from_millis(2), move |_ctx, t| {
                    let j = Arc::clone(&j);
                    async move {
                        j.lock().unwrap().push(format!("{} #{}", t.name(), t.count()));
                        assert!(t.tick() >= t.started());
                        Ok(())
                    }
                })
                .await;
                Ok(())
            }
        });

        let status = supervisor()
            .run_until("app", app, std::future::pending())
            .await;

        assert_eq!(status, ExitStatus::Success);
        assert_eq!(
            *journal.lock().unwrap(),
            vec!["app.1.1 #1", "app.1.1 #2", "app.1.1 #3"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unlimited_ticker_ends_on_shutdown() {
        let ticks = Arc::new(Mutex::new(0u32));
        let seen = Arc::clone(&ticks);

        let app = RunnerFn::arc(move |ctx: CancellationToken, node: Node| {
            let seen = Arc::clone(&seen);
            async move {
                linear(&ctx, &node, Duration::from_millis(5), move |_ctx, _t| {
                    let seen = Arc::clone(&seen);
                    async move {
                        *seen.lock().unwrap() += 1;
                        Ok(())
                    }
                })
                .await;
                Ok(())
            }
        });

        let status = tokio::time::timeout(
            Duration::from_secs(5),
            supervisor().run_until("app", app, tokio::time::sleep(Duration::from_millis(60))),
        )
        .await
        .expect("stop hook must end the ticker");

        assert_eq!(status, ExitStatus::Success);
        assert!(*ticks.lock().unwrap() > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tick_stop_ends_the_ticker() {
        let app = RunnerFn::arc(|ctx: CancellationToken, node: Node| async move {
            linear(&ctx, &node, Duration::ZERO, |_ctx, t| async move {
                if t.count() == 4 {
                    t.stop();
                }
                assert!(t.count() <= 4);
                Ok(())
            })
            .await;
            Ok(())
        });

        let status = supervisor()
            .run_until("app", app, std::future::pending())
            .await;
        assert_eq!(status, ExitStatus::Success);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tick_error_fails_the_run() {
        let app = RunnerFn::arc(|ctx: CancellationToken, node: Node| async move {
            exponential(&ctx, &node, 0, Duration::from_millis(1), |_ctx, t| async move {
                if t.count() == 2 {
                    t.error("sensor offline")?;
                }
                Ok::<_, Abort>(())
            })
            .await;
            Ok(())
        });

        let status = supervisor()
            .run_until("app", app, std::future::pending())
            .await;
        assert_eq!(status, ExitStatus::Failure);
    }
}
