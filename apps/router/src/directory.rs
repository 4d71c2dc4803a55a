//! Chatbot id to webhook lookup.
use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatbotRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl ChatbotRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            webhook_url: None,
        }
    }

    pub fn with_webhook(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Configured webhook, if any. Blank values count as unconfigured.
    pub fn webhook(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("chatbot directory unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ChatbotDirectory: Send + Sync {
    async fn lookup(&self, chatbot_id: &str) -> Result<Option<ChatbotRecord>, DirectoryError>;
}

pub type SharedDirectory = Arc<dyn ChatbotDirectory>;

/// Whether `raw` is an absolute http(s) URL.
pub fn is_valid_webhook(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

#[derive(Default)]
pub struct MemoryDirectory {
    records: DashMap<String, ChatbotRecord>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ChatbotRecord>) -> Self {
        let directory = Self::new();
        for record in records {
            directory.insert(record);
        }
        directory
    }

    /// Loads records from a JSON array. A missing file yields an empty directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "chatbot file not found; starting with no chatbots");
            return Ok(Self::new());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let records: Vec<ChatbotRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid chatbot records in {}", path.display()))?;
        let directory = Self::from_records(records);
        info!(path = %path.display(), chatbots = directory.len(), "chatbot directory loaded");
        Ok(directory)
    }

    /// Adds or replaces a record. An invalid webhook URL is dropped so the chatbot reads as
    /// unconfigured.
    pub fn insert(&self, mut record: ChatbotRecord) {
        if let Some(url) = record.webhook()
            && !is_valid_webhook(url)
        {
            warn!(chatbot_id = %record.id, webhook_url = %url, "ignoring invalid webhook url");
            record.webhook_url = None;
        }
        self.records.insert(record.id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ChatbotDirectory for MemoryDirectory {
    async fn lookup(&self, chatbot_id: &str) -> Result<Option<ChatbotRecord>, DirectoryError> {
        Ok(self
            .records
            .get(chatbot_id)
            .map(|entry| entry.value().clone()))
    }
}
