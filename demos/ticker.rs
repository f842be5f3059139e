//! # Example: ticker
//!
//! Three tickers side by side:
//! - every second, forever;
//! - every two seconds, five times, with stop/done hooks;
//! - exponential from 200ms, ten times.
//!
//! ## Run
//! ```bash
//! RUST_LOG=nodevisor=debug cargo run --example ticker
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use nodevisor::tick::{self, LinearBackoff, Ticker};
use nodevisor::{Node, RunnerFn};
use tokio_util::sync::CancellationToken;

fn millis(t: SystemTime) -> u128 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    nodevisor::run(
        "ticker",
        RunnerFn::arc(|ctx: CancellationToken, node: Node| async move {
            tick::linear(&ctx, &node, Duration::from_secs(1), |_ctx, t| async move {
                println!("ticker {} tick at: {}", t.name(), millis(t.tick()));
                Ok(())
            })
            .await;

            let limited = Ticker::new(
                LinearBackoff::new(Duration::from_secs(2)),
                |_ctx: CancellationToken, t: tick::Tick| async move {
                    if t.count() == 1 {
                        let name = t.name().to_string();
                        t.on()
                            .stop(move || {
                                println!("stop ticker {name}");
                                Ok(())
                            });
                        let name = t.name().to_string();
                        t.on().done(move || {
                            println!("done ticker {name}");
                            Ok(())
                        });
                    }
                    println!("ticker {} tick #{} at: {}", t.name(), t.count(), millis(t.tick()));
                    Ok(())
                },
            )
            .until(5);
            node.run(&ctx, [limited.arc()]).await;

            tick::exponential(&ctx, &node, 10, Duration::from_millis(200), |_ctx, t| async move {
                println!("exponential ticker {} tick at: {}", t.name(), millis(t.tick()));
                Ok(())
            })
            .await;
            Ok(())
        }),
    )
}
