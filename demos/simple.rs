//! # Example: simple
//!
//! Two blocking children under the root runner, each with a stop hook.
//!
//! ## Flow
//! ```text
//! simple.1        "work"  (blocks caller until done)
//!   ├─► simple.1.1  "work"
//!   └─► simple.1.2  "work"
//! natural completion → stop: simple.1.2 → simple.1.1 → simple.1
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example simple
//! ```

use nodevisor::{Node, RunnerFn, RunnerRef};
use tokio_util::sync::CancellationToken;

fn worker() -> RunnerRef {
    RunnerFn::arc(|_ctx: CancellationToken, node: Node| async move {
        let name = node.name().to_string();
        node.on().stop(move || {
            println!("done some work in: {name}");
            Ok(())
        });
        println!("do some work in: {}", node.name());
        Ok(())
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    nodevisor::run(
        "simple",
        RunnerFn::arc(|ctx: CancellationToken, node: Node| async move {
            let name = node.name().to_string();
            node.on().stop(move || {
                println!("done some work in: {name}");
                Ok(())
            });
            println!("do some work in: {}", node.name());

            node.run(&ctx, [worker()]).await;
            node.run(&ctx, [worker()]).await;
            Ok(())
        }),
    )
}
