use std::sync::Arc;

use super::supervisor::{Finalizer, Supervisor};
use crate::{core::SupervisorConfig, error::BoxError, events::Bus, subscribers::Subscribe};

/// Builder for constructing a [`Supervisor`] with optional subscribers and finalizers.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    finalizers: Vec<Finalizer>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            finalizers: Vec::new(),
        }
    }

    /// Sets lifecycle event subscribers.
    ///
    /// Subscribers receive events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Appends a finalizer run once the tree has fully stopped.
    ///
    /// Finalizers run in registration order; a failing or panicking finalizer turns
    /// the outcome into [`ExitStatus::Failure`](crate::ExitStatus::Failure) but the
    /// rest still run.
    pub fn with_finalizer<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.finalizers.push(Arc::new(f));
        self
    }

    /// Builds the supervisor.
    pub fn build(self) -> Supervisor {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        Supervisor::new_internal(self.cfg, bus, self.subscribers, self.finalizers)
    }
}
