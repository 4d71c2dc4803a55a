//! Upstream webhook delivery.
use std::time::Duration;

use reqwest::Client;
use serde_json::{Map, Value};
use time::{OffsetDateTime, UtcOffset, macros::format_description};
use tracing::{debug, warn};

use crate::{directory::ChatbotRecord, error::RouteError};

/// Adds `chatbotId`, `chatbotName` and `timestamp` to the widget's payload. Router fields
/// overwrite same-named fields from the widget.
pub fn enrich(
    mut body: Map<String, Value>,
    record: &ChatbotRecord,
    now: OffsetDateTime,
) -> Result<Value, RouteError> {
    // ISO-8601 with millisecond precision, as browsers print it.
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    let timestamp = now
        .to_offset(UtcOffset::UTC)
        .format(format)
        .map_err(|err| RouteError::Internal(err.to_string()))?;
    body.insert("chatbotId".into(), Value::String(record.id.clone()));
    body.insert("chatbotName".into(), Value::String(record.name.clone()));
    body.insert("timestamp".into(), Value::String(timestamp));
    Ok(Value::Object(body))
}

#[derive(Clone)]
pub struct HttpForwarder {
    client: Client,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Posts `payload` and returns the decoded JSON reply. The timeout bounds the whole
    /// exchange, body included.
    pub async fn forward(&self, webhook_url: &str, payload: &Value) -> Result<Value, RouteError> {
        let exchange = async {
            let response = self
                .client
                .post(webhook_url)
                .json(payload)
                .send()
                .await
                .map_err(|err| RouteError::Unreachable(err.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                warn!(status = status.as_u16(), "webhook responded with an error");
                return Err(RouteError::UpstreamStatus(status.as_u16()));
            }
            response
                .json::<Value>()
                .await
                .map_err(|err| RouteError::Unreachable(err.to_string()))
        };
        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                debug!(timeout_ms = self.timeout.as_millis() as u64, "webhook timed out");
                Err(RouteError::Timeout)
            }
        }
    }
}
