//! Test doubles for embedding the widget without a network.
use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::webhook::{WebhookClient, WebhookError, WebhookReply};

#[derive(Debug, Clone)]
enum Step {
    Reply { output: Value, delay: Duration },
    Status { status: u16, delay: Duration },
}

/// Webhook client answering from a fixed script, one step per request, and recording every
/// request it sees. An exhausted script answers `503`.
#[derive(Debug, Default)]
pub struct ScriptedWebhookClient {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl ScriptedWebhookClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, output: &str) -> Self {
        self.reply_after(Duration::ZERO, output)
    }

    pub fn reply_after(self, delay: Duration, output: &str) -> Self {
        self.push(Step::Reply {
            output: Value::String(output.to_string()),
            delay,
        })
    }

    /// Reply whose body has no string `output`.
    pub fn reply_without_output(self) -> Self {
        self.push(Step::Reply {
            output: Value::Null,
            delay: Duration::ZERO,
        })
    }

    pub fn status(self, status: u16) -> Self {
        self.push(Step::Status {
            status,
            delay: Duration::ZERO,
        })
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(self, step: Step) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(step);
        self
    }
}

#[async_trait]
impl WebhookClient for ScriptedWebhookClient {
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<WebhookReply, WebhookError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((endpoint.to_string(), payload.clone()));
        let step = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match step {
            Some(Step::Reply { output, delay }) => {
                tokio::time::sleep(delay).await;
                Ok(WebhookReply::from_value(&serde_json::json!({ "output": output })))
            }
            Some(Step::Status { status, delay }) => {
                tokio::time::sleep(delay).await;
                Err(WebhookError::Status {
                    status,
                    body: String::new(),
                })
            }
            None => Err(WebhookError::Status {
                status: 503,
                body: "script exhausted".into(),
            }),
        }
    }
}
