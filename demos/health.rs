//! # Example: health
//!
//! Background services registering probe sensors, a checker ticking over the global
//! registry, and the built-in [`LogWriter`] printing lifecycle events.
//!
//! ## Run
//! ```bash
//! cargo run --example health --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use nodevisor::probe::{self, Mode, SensorFn};
use nodevisor::{LogWriter, Node, RunnerFn, RunnerRef, Subscribe, Supervisor, SupervisorConfig, tick};
use tokio_util::sync::CancellationToken;

fn service(sensor: &'static str, mode: Mode) -> RunnerRef {
    RunnerFn::arc(move |_ctx: CancellationToken, node: Node| async move {
        node.parallel();

        probe::register([SensorFn::arc(sensor, mode, |_ctx: CancellationToken| async {
            Ok(())
        })]);

        let release = CancellationToken::new();
        let trigger = release.clone();
        node.on().stop(move || {
            trigger.cancel();
            Ok(())
        });

        release.cancelled().await;
        Ok(())
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sup = Supervisor::builder(SupervisorConfig::default())
        .with_subscribers(subs)
        .with_finalizer(|| {
            println!("sensors registered: {}", probe::global().len());
            Ok(())
        })
        .build();

    let app = RunnerFn::arc(|ctx: CancellationToken, node: Node| async move {
        node.run(
            &ctx,
            [
                service("sensor1", Mode::ALL),
                service("sensor2", Mode::STARTUP_LIVENESS),
            ],
        )
        .await;

        tick::linear(&ctx, &node, Duration::from_secs(2), |ctx, _t| async move {
            for mode in ["startup", "readiness", "liveness"] {
                let Ok(mode) = mode.parse::<Mode>() else {
                    continue;
                };
                match probe::report(&ctx, probe::global(), mode).await {
                    Ok(r) => println!("[{mode}] healthy={} {}", r.healthy, r.body),
                    Err(err) => println!("[{mode}] {err}"),
                }
            }
            Ok(())
        })
        .await;
        Ok(())
    });

    let runtime = tokio::runtime::Runtime::new()?;
    let status = runtime.block_on(sup.run("health", app));
    std::process::exit(sup.config().exit_code(status))
}
