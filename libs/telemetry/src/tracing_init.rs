use std::sync::OnceLock;

use anyhow::Result;
use tracing::Span;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{DEFAULT_FILTER, TelemetryConfig};

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber once; later calls are no-ops.
pub fn init_telemetry(cfg: &TelemetryConfig) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let fmt_layer = if cfg.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    let env_filter =
        EnvFilter::try_new(&cfg.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .ok();
    INIT.set(()).ok();

    tracing::info!(
        service = %cfg.service_name,
        version = %cfg.service_version,
        environment = %cfg.environment,
        "telemetry installed"
    );
    Ok(())
}

/// Records routing identifiers on a span declared with `chatbot_id` and `request_id` fields.
pub fn with_route_fields(span: &Span, chatbot_id: &str, request_id: Option<&str>) {
    span.record("chatbot_id", tracing::field::display(chatbot_id));
    if let Some(request_id) = request_id {
        span.record("request_id", tracing::field::display(request_id));
    }
}
