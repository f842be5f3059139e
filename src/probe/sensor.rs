//! # Health sensors.
//!
//! A [`Sensor`] is a named check bound to a [`Mode`]. [`SensorFn`] adapts an async
//! closure into a sensor.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use nodevisor::probe::{Mode, Sensor, SensorFn};
//!
//! let db = SensorFn::arc("db", Mode::READINESS, |_ctx: CancellationToken| async move {
//!     Ok(())
//! });
//! assert_eq!(db.name(), "db");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::probe::Mode;

/// A health check.
#[async_trait]
pub trait Sensor: Send + Sync + 'static {
    /// Name shown in reports.
    fn name(&self) -> &str;

    /// Modes this sensor is checked in.
    fn mode(&self) -> Mode;

    /// Runs the check. `Err` reports the sensor as failed.
    async fn check(&self, ctx: CancellationToken) -> Result<(), BoxError>;
}

/// Shared handle to a sensor.
pub type SensorRef = Arc<dyn Sensor>;

/// Closure-backed sensor.
pub struct SensorFn<F> {
    name: Cow<'static, str>,
    mode: Mode,
    f: F,
}

impl<F, Fut> SensorFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    /// Creates a sensor named `name`, checked in `mode`, running `f`.
    pub fn new(name: impl Into<Cow<'static, str>>, mode: Mode, f: F) -> Self {
        Self {
            name: name.into(),
            mode,
            f,
        }
    }

    /// Creates the sensor and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, mode: Mode, f: F) -> SensorRef {
        Arc::new(Self::new(name, mode, f))
    }
}

#[async_trait]
impl<F, Fut> Sensor for SensorFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    async fn check(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        (self.f)(ctx).await
    }
}
