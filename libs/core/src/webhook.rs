//! Outbound delivery of visitor messages to the routing endpoint.
use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::config::MetadataValue;

/// Client-side bound on one round trip. Sits above the router's upstream timeout so the
/// router's 504 reaches the widget first.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Shown when the reply decodes but carries no usable `output`.
pub const ISSUE_MESSAGE: &str = "Sorry, I couldn't process that request.";

pub const CHAT_INPUT_KEY: &str = "chatInput";
pub const SESSION_ID_KEY: &str = "sessionId";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook timed out after {0:?}")]
    Timeout(Duration),
    #[error("webhook returned HTTP {status}")]
    Status { status: u16, body: String },
    #[error("webhook reply is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WebhookReply {
    pub output: Option<String>,
}

impl WebhookReply {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
        }
    }

    /// Reads `output` from a decoded reply. Anything but a non-empty string counts as missing.
    pub fn from_value(value: &Value) -> Self {
        let output = value
            .get("output")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        Self { output }
    }

    /// Text to show as the bot message.
    pub fn text(&self) -> &str {
        self.output.as_deref().unwrap_or(ISSUE_MESSAGE)
    }
}

pub fn parse_reply(body: &[u8]) -> Result<WebhookReply, WebhookError> {
    let value: Value = serde_json::from_slice(body)?;
    Ok(WebhookReply::from_value(&value))
}

#[async_trait]
pub trait WebhookClient: Send + Sync {
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<WebhookReply, WebhookError>;
}

pub type SharedWebhookClient = Arc<dyn WebhookClient>;

#[derive(Clone)]
pub struct HttpWebhookClient {
    client: Client,
    timeout: Duration,
}

impl HttpWebhookClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpWebhookClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<WebhookReply, WebhookError> {
        let exchange = async {
            let response = self.client.post(endpoint).json(payload).send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            if !status.is_success() {
                return Err(WebhookError::Status {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                });
            }
            parse_reply(&body)
        };
        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| WebhookError::Timeout(self.timeout))?
    }
}

/// Request body `{ chatInput, sessionId, ...metadata }`.
///
/// Metadata stays at the top level; the two reserved keys are written last and win.
pub fn build_payload(
    text: &str,
    session_id: &str,
    metadata: &BTreeMap<String, MetadataValue>,
) -> Value {
    let mut body = Map::new();
    for (key, value) in metadata {
        if key == CHAT_INPUT_KEY || key == SESSION_ID_KEY {
            warn!(key = %key, "metadata key collides with a reserved field; ignoring it");
            continue;
        }
        let value = match value {
            MetadataValue::Text(text) => Value::String(text.clone()),
            MetadataValue::Number(number) => Value::Number(number.clone()),
        };
        body.insert(key.clone(), value);
    }
    body.insert(CHAT_INPUT_KEY.into(), Value::String(text.to_string()));
    body.insert(SESSION_ID_KEY.into(), Value::String(session_id.to_string()));
    Value::Object(body)
}
