//! # Running sensors and rendering their reports.
//!
//! ```text
//! report(ctx, registry, mode)
//!   ├─► registry.sensors_for(mode)
//!   ├─► run: every sensor concurrently   (panic or Err → Failed)
//!   └─► JSON: [{"name":..,"mode":[..],"status":"success"|"failed"}, ..]
//!         healthy = no sensor failed
//! ```

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::AbortValue;
use crate::probe::{Mode, ProbeError, Registry, SensorRef, Status};

/// Result of one sensor check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Sensor name.
    pub name: String,
    /// Modes the sensor runs in.
    pub mode: Mode,
    /// Outcome of the check.
    pub status: Status,
}

/// Rendered outcome of a probe.
#[derive(Clone, Debug)]
pub struct Rendered {
    /// False if any sensor failed.
    pub healthy: bool,
    /// JSON array of [`Report`]s.
    pub body: String,
}

/// Runs every sensor concurrently. Reports come back in the order of `sensors`.
pub async fn run(ctx: &CancellationToken, sensors: &[SensorRef]) -> Vec<Report> {
    join_all(sensors.iter().map(|sensor| check(ctx.clone(), sensor))).await
}

async fn check(ctx: CancellationToken, sensor: &SensorRef) -> Report {
    let status = match AssertUnwindSafe(sensor.check(ctx)).catch_unwind().await {
        Ok(Ok(())) => Status::Success,
        Ok(Err(err)) => {
            tracing::warn!(sensor = sensor.name(), error = %err, "sensor failed");
            Status::Failed
        }
        Err(payload) => {
            let panic = AbortValue::from_panic(payload);
            tracing::warn!(sensor = sensor.name(), error = %panic, "sensor panicked");
            Status::Failed
        }
    };
    Report {
        name: sensor.name().to_string(),
        mode: sensor.mode(),
        status,
    }
}

/// Runs the sensors of `registry` matching `mode` and renders their reports as JSON.
pub async fn report(
    ctx: &CancellationToken,
    registry: &Registry,
    mode: Mode,
) -> Result<Rendered, ProbeError> {
    let reports = run(ctx, &registry.sensors_for(mode)).await;
    let healthy = reports.iter().all(|r| r.status.is_success());
    let body = serde_json::to_string(&reports)?;
    Ok(Rendered { healthy, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::probe::SensorFn;
    use std::time::Duration;

    fn registry() -> Registry {
        let reg = Registry::new();
        reg.register([
            SensorFn::arc("slow", Mode::READINESS, |_ctx: CancellationToken| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(())
            }),
            SensorFn::arc("boot", Mode::STARTUP_LIVENESS, |_ctx: CancellationToken| async {
                Ok(())
            }),
            SensorFn::arc("db", Mode::READINESS, |_ctx: CancellationToken| async {
                Err::<(), BoxError>("connection refused".into())
            }),
        ]);
        reg
    }

    #[tokio::test]
    async fn reports_keep_registration_order() {
        let ctx = CancellationToken::new();
        let reports = run(&ctx, &registry().sensors()).await;

        let summary: Vec<(&str, Status)> =
            reports.iter().map(|r| (r.name.as_str(), r.status)).collect();
        assert_eq!(
            summary,
            vec![
                ("slow", Status::Success),
                ("boot", Status::Success),
                ("db", Status::Failed),
            ]
        );
    }

    #[tokio::test]
    async fn renders_filtered_json() {
        let ctx = CancellationToken::new();
        let reg = registry();

        let live = report(&ctx, &reg, Mode::LIVENESS).await.unwrap();
        assert!(live.healthy);
        assert_eq!(
            live.body,
            r#"[{"name":"boot","mode":["liveness","startup"],"status":"success"}]"#
        );

        let ready = report(&ctx, &reg, Mode::READINESS).await.unwrap();
        assert!(!ready.healthy);
        assert_eq!(
            ready.body,
            concat!(
                r#"[{"name":"slow","mode":["readiness"],"status":"success"},"#,
                r#"{"name":"db","mode":["readiness"],"status":"failed"}]"#
            )
        );
    }

    #[tokio::test]
    async fn panicking_sensor_fails() {
        let ctx = CancellationToken::new();
        let reg = Registry::new();
        reg.register([SensorFn::arc(
            "flaky",
            Mode::LIVENESS,
            |ctx: CancellationToken| async move {
                if !ctx.is_cancelled() {
                    panic!("sensor exploded");
                }
                Ok(())
            },
        )]);

        let rendered = report(&ctx, &reg, Mode::ALL).await.unwrap();
        assert!(!rendered.healthy);
    }

    #[tokio::test]
    async fn empty_selection_is_healthy() {
        let rendered = report(&CancellationToken::new(), &Registry::new(), Mode::ALL)
            .await
            .unwrap();
        assert!(rendered.healthy);
        assert_eq!(rendered.body, "[]");
    }
}
