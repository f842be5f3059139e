//! # Example: parallel
//!
//! Background nodes that block until their stop hook releases them.
//! Press Ctrl-C to start the teardown.
//!
//! ## Flow
//! ```text
//! parallel.1
//!   ├─► parallel.1.1            (blocking, stop/done hooks)
//!   │     └─► parallel.1.1.1    (background, blocks on release)
//!   └─► parallel.1.2            (background, blocks on release)
//!
//! Ctrl-C → stop parallel.1.2 → stop parallel.1.1.1 → stop parallel.1.1 → parallel.1
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example parallel
//! ```

use nodevisor::{Node, RunnerFn, RunnerRef};
use tokio_util::sync::CancellationToken;

fn blocker() -> RunnerRef {
    RunnerFn::arc(|_ctx: CancellationToken, node: Node| async move {
        node.parallel();

        let release = CancellationToken::new();
        let trigger = release.clone();
        let name = node.name().to_string();
        node.on().stop(move || {
            println!("release {name}");
            trigger.cancel();
            Ok(())
        });
        let name = node.name().to_string();
        node.on().done(move || {
            println!("done {name}");
            Ok(())
        });

        println!("block {}", node.name());
        release.cancelled().await;
        println!("unblocked {}", node.name());
        Ok(())
    })
}

fn main() {
    nodevisor::run(
        "parallel",
        RunnerFn::arc(|ctx: CancellationToken, node: Node| async move {
            let branch = RunnerFn::arc(|ctx: CancellationToken, node: Node| async move {
                let name = node.name().to_string();
                node.on().done(move || {
                    println!("done {name}");
                    Ok(())
                });
                let name = node.name().to_string();
                node.on().stop(move || {
                    println!("stop {name}");
                    Ok(())
                });
                node.run(&ctx, [blocker()]).await;
                Ok(())
            });

            node.run(&ctx, [branch, blocker()]).await;
            Ok(())
        }),
    )
}
