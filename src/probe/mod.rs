//! # Health probes.
//!
//! - [`Mode`] - startup / readiness / liveness bit set
//! - [`Sensor`], [`SensorFn`] - named health checks
//! - [`Registry`], [`global`], [`register`] - where sensors are kept
//! - [`run`], [`report`] - run sensors concurrently and render their [`Report`]s
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use nodevisor::probe::{self, Mode, SensorFn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! probe::register([SensorFn::arc("disk", Mode::LIVENESS, |_ctx: CancellationToken| async {
//!     Ok(())
//! })]);
//!
//! let rendered = probe::report(&CancellationToken::new(), probe::global(), Mode::LIVENESS)
//!     .await
//!     .unwrap();
//! assert!(rendered.healthy);
//! # }
//! ```

mod error;
mod mode;
mod registry;
mod report;
mod sensor;
mod status;

pub use error::ProbeError;
pub use mode::Mode;
pub use registry::{Registry, global, register};
pub use report::{Rendered, Report, report, run};
pub use sensor::{Sensor, SensorFn, SensorRef};
pub use status::Status;
