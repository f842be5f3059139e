//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`], the settings consumed by
//! [`SupervisorBuilder`](crate::SupervisorBuilder).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 when the bus is created

use crate::core::supervisor::ExitStatus;

/// Configuration of a [`Supervisor`](crate::Supervisor).
///
/// ## Field semantics
/// - `bus_capacity`: lifecycle event ring buffer size (min 1)
/// - `failure_code`: process exit code reported for [`ExitStatus::Failure`]
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Capacity of the lifecycle event broadcast channel.
    ///
    /// Slow subscribers lagging more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Exit code used by [`Supervisor::run_blocking`](crate::Supervisor::run_blocking)
    /// when the tree faulted, a finalizer failed or the runtime could not start.
    pub failure_code: i32,
}

impl SupervisorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Maps a run outcome to a process exit code.
    #[inline]
    pub fn exit_code(&self, status: ExitStatus) -> i32 {
        match status {
            ExitStatus::Success => 0,
            ExitStatus::Failure => self.failure_code,
        }
    }
}

impl Default for SupervisorConfig {
    /// - `bus_capacity = 1024`
    /// - `failure_code = 1`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            failure_code: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_exit_codes() {
        let cfg = SupervisorConfig::default();
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
        assert_eq!(cfg.exit_code(ExitStatus::Success), 0);
        assert_eq!(cfg.exit_code(ExitStatus::Failure), 1);

        let cfg = SupervisorConfig {
            bus_capacity: 0,
            failure_code: 70,
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.exit_code(ExitStatus::Failure), 70);
    }
}
