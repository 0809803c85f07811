//! Telemetry module
//!
//! Structured logging and Prometheus metrics.

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{record_latency, set_gauge, GaugeMetric, LatencyMetric};

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Guard that cleans up telemetry on drop
pub struct TelemetryGuard {
    _priv: (),
}

/// Initialize all telemetry subsystems
///
/// A metrics exporter that fails to bind (port in use, no privileges) is
/// logged and skipped; the engine trades without it.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level)?;

    let builder =
        PrometheusBuilder::new().with_http_listener(([0, 0, 0, 0], config.metrics_port));
    if let Err(e) = builder.install() {
        tracing::warn!(error = %e, port = config.metrics_port, "Metrics exporter not started");
    }

    Ok(TelemetryGuard { _priv: () })
}
