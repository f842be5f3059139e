//! # Per-node stop/done hook lists.
//!
//! [`Hooks`] holds two independent, append-only callback lists:
//! - **stop** hooks run during the teardown cascade, after the node's subtree is stopped;
//! - **done** hooks run once, right after the runner body returns or faults.
//!
//! Both lists execute last-registered-first (scoped-cleanup order). A hook that returns
//! `Err` or panics is reported as a [`CleanupFault`](crate::CleanupFault); the remaining
//! hooks still run.
//!
//! ## Example
//! ```text
//! on().stop(a); on().stop(b); on().done(c)
//!
//! teardown:  b → a
//! finish:    c
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{BoxError, HookKind};

/// Callback stored in a hook list.
pub type HookFn = Arc<dyn Fn() -> Result<(), BoxError> + Send + Sync>;

/// Stop and done hook lists of one node, returned by [`Node::on`](crate::Node::on).
#[derive(Default)]
pub struct Hooks {
    stop: RwLock<Vec<HookFn>>,
    done: RwLock<Vec<HookFn>>,
}

impl Hooks {
    /// Registers a hook to run when the node is torn down.
    ///
    /// A stop hook is where a background runner's blocking condition is released.
    pub fn stop<F>(&self, f: F) -> &Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.add(HookKind::Stop, Arc::new(f));
        self
    }

    /// Registers a hook to run once the runner body has returned or faulted.
    pub fn done<F>(&self, f: F) -> &Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.add(HookKind::Done, Arc::new(f));
        self
    }

    /// Registers several stop hooks at once, as if by calling [`Hooks::stop`] for each in order.
    pub fn stop_all<I>(&self, hooks: I) -> &Self
    where
        I: IntoIterator<Item = HookFn>,
    {
        self.extend(HookKind::Stop, hooks);
        self
    }

    /// Registers several done hooks at once, as if by calling [`Hooks::done`] for each in order.
    pub fn done_all<I>(&self, hooks: I) -> &Self
    where
        I: IntoIterator<Item = HookFn>,
    {
        self.extend(HookKind::Done, hooks);
        self
    }

    fn list(&self, kind: HookKind) -> &RwLock<Vec<HookFn>> {
        match kind {
            HookKind::Stop => &self.stop,
            HookKind::Done => &self.done,
        }
    }

    fn add(&self, kind: HookKind, hook: HookFn) {
        self.list(kind)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    fn extend<I>(&self, kind: HookKind, hooks: I)
    where
        I: IntoIterator<Item = HookFn>,
    {
        self.list(kind)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(hooks);
    }

    /// Returns the hooks of `kind` in execution order (last registered first).
    pub(crate) fn ordered(&self, kind: HookKind) -> Vec<HookFn> {
        let list = self.list(kind).read().unwrap_or_else(PoisonError::into_inner);
        list.iter().rev().cloned().collect()
    }

    /// Number of registered hooks of `kind`.
    pub fn len(&self, kind: HookKind) -> usize {
        self.list(kind)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn lists_are_independent_and_reversed() {
        let hooks = Hooks::default();
        let journal = Arc::new(Mutex::new(Vec::new()));

        for tag in ["s1", "s2", "s3"] {
            let j = Arc::clone(&journal);
            hooks.stop(move || {
                j.lock().unwrap().push(tag);
                Ok(())
            });
        }
        let j = Arc::clone(&journal);
        hooks.done(move || {
            j.lock().unwrap().push("d1");
            Ok(())
        });

        assert_eq!(hooks.len(HookKind::Stop), 3);
        assert_eq!(hooks.len(HookKind::Done), 1);

        for hook in hooks.ordered(HookKind::Stop) {
            hook().unwrap();
        }
        assert_eq!(*journal.lock().unwrap(), vec!["s3", "s2", "s1"]);

        for hook in hooks.ordered(HookKind::Done) {
            hook().unwrap();
        }
        assert_eq!(journal.lock().unwrap().last(), Some(&"d1"));
    }

    #[test]
    fn registration_chains() {
        let hooks = Hooks::default();
        hooks.stop(|| Ok(())).done(|| Ok(())).stop(|| Err("x".into()));
        assert_eq!(hooks.len(HookKind::Stop), 2);
        assert_eq!(hooks.len(HookKind::Done), 1);
    }

    #[test]
    fn batch_registration_keeps_argument_order() {
        let hooks = Hooks::default();
        let journal = Arc::new(Mutex::new(Vec::new()));
        let hook = |tag: &'static str| -> HookFn {
            let j = Arc::clone(&journal);
            Arc::new(move || {
                j.lock().unwrap().push(tag);
                Ok(())
            })
        };

        hooks
            .stop(|| Ok(()))
            .stop_all([hook("a"), hook("b")])
            .done_all(vec![hook("c")]);
        assert_eq!(hooks.len(HookKind::Stop), 3);
        assert_eq!(hooks.len(HookKind::Done), 1);

        for h in hooks.ordered(HookKind::Stop).into_iter().take(2) {
            h().unwrap();
        }
        assert_eq!(*journal.lock().unwrap(), vec!["b", "a"]);
    }
}
