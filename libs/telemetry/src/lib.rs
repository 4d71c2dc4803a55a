//! Telemetry helpers shared by chat widget services: subscriber installation from the
//! environment, span field helpers and metric labels.

use anyhow::Result;

mod config;
mod context;
mod tracing_init;

pub use config::{DEFAULT_FILTER, TelemetryConfig};
pub use context::RouteLabels;
pub use tracing_init::{init_telemetry, with_route_fields};

/// Installs the subscriber configured from `LOG_FORMAT`, `RUST_LOG` and `OTEL_SERVICE_NAME`.
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env(
        service_name,
        env!("CARGO_PKG_VERSION"),
    ))
}

pub fn record_counter(name: &'static str, value: u64, labels: &RouteLabels) {
    metrics::counter!(name, labels.labels()).increment(value);
}
