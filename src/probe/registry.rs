//! # Sensor registry.
//!
//! [`Registry`] is an append-only list of sensors. [`global`] returns the process-wide
//! instance, created on first use and never reset.

use std::sync::{OnceLock, PoisonError, RwLock};

use crate::probe::{Mode, SensorRef};

/// Append-only sensor list, safe for concurrent registration and reads.
#[derive(Default)]
pub struct Registry {
    sensors: RwLock<Vec<SensorRef>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends sensors in the given order.
    pub fn register<I>(&self, sensors: I)
    where
        I: IntoIterator<Item = SensorRef>,
    {
        self.sensors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(sensors);
    }

    /// Snapshot of every registered sensor, in registration order.
    pub fn sensors(&self) -> Vec<SensorRef> {
        self.sensors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the sensors running in any of the modes of `mode`.
    pub fn sensors_for(&self, mode: Mode) -> Vec<SensorRef> {
        self.sensors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.mode().intersects(mode))
            .cloned()
            .collect()
    }

    /// Number of registered sensors.
    pub fn len(&self) -> usize {
        self.sensors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if no sensor is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide registry.
pub fn global() -> &'static Registry {
    static GLOBAL: OnceLock<Registry> = OnceLock::new();
    GLOBAL.get_or_init(Registry::new)
}

/// Registers sensors on the process-wide registry.
pub fn register<I>(sensors: I)
where
    I: IntoIterator<Item = SensorRef>,
{
    global().register(sensors);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::SensorFn;
    use tokio_util::sync::CancellationToken;

    fn sensor(name: &'static str, mode: Mode) -> SensorRef {
        SensorFn::arc(name, mode, |_ctx: CancellationToken| async { Ok(()) })
    }

    #[test]
    fn filters_by_mode_keeping_order() {
        let reg = Registry::new();
        reg.register([
            sensor("boot", Mode::STARTUP),
            sensor("db", Mode::READINESS),
            sensor("heart", Mode::STARTUP_LIVENESS),
        ]);
        reg.register([sensor("cache", Mode::ALL)]);

        let names = |v: Vec<SensorRef>| v.iter().map(|s| s.name().to_string()).collect::<Vec<_>>();
        assert_eq!(names(reg.sensors()), vec!["boot", "db", "heart", "cache"]);
        assert_eq!(names(reg.sensors_for(Mode::STARTUP)), vec!["boot", "heart", "cache"]);
        assert_eq!(names(reg.sensors_for(Mode::READINESS)), vec!["db", "cache"]);
        assert_eq!(names(reg.sensors_for(Mode::default())), Vec::<String>::new());
    }

    #[test]
    fn global_is_shared() {
        let before = global().len();
        register([sensor("global-probe", Mode::LIVENESS)]);
        assert!(global().len() > before);
        assert!(std::ptr::eq(global(), global()));
    }
}
