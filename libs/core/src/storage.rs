//! Durable client-side state: session ids, message history and the open flag.
//!
//! Key layout:
//! - `chatbot_session_{chatbotId}` holds the session id
//! - `chatbot_messages_{sessionId}` holds the JSON message array
//! - `chatbot_open_{sessionId}` holds `"true"` or `"false"`
use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::message::Message;

mod file;

pub use file::FileStore;

const SESSION_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SESSION_SUFFIX_LEN: usize = 9;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error")]
    Io(#[from] std::io::Error),
    #[error("storage document is not valid JSON")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Origin-scoped string key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Returns an in-memory store wrapped in an [`Arc`].
pub fn memory_store() -> SharedStore {
    Arc::new(MemoryStore::new())
}

pub fn session_key(chatbot_id: &str) -> String {
    format!("chatbot_session_{chatbot_id}")
}

pub fn messages_key(session_id: &str) -> String {
    format!("chatbot_messages_{session_id}")
}

pub fn open_key(session_id: &str) -> String {
    format!("chatbot_open_{session_id}")
}

/// Typed access to the widget's keys. Failures are logged, never returned: the widget keeps
/// working from in-memory state when storage is unavailable.
#[derive(Clone)]
pub struct Persistence {
    store: SharedStore,
}

impl Persistence {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn save_messages(&self, session_id: &str, messages: &[Message]) {
        let encoded = match serde_json::to_string(messages) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(error = %err, "failed to encode messages");
                return;
            }
        };
        if let Err(err) = self.store.set(&messages_key(session_id), &encoded) {
            warn!(error = %err, session_id, "failed to save messages");
        }
    }

    /// Stored messages in order. Missing or malformed data yields an empty list.
    pub fn load_messages(&self, session_id: &str) -> Vec<Message> {
        let raw = match self.store.get(&messages_key(session_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, session_id, "failed to read messages");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            debug!(error = %err, session_id, "discarding malformed stored messages");
            Vec::new()
        })
    }

    pub fn get_or_create_session(&self, chatbot_id: &str) -> String {
        let key = session_key(chatbot_id);
        match self.store.get(&key) {
            Ok(Some(existing)) if !existing.trim().is_empty() => return existing,
            Ok(_) => {}
            Err(err) => warn!(error = %err, chatbot_id, "failed to read session id"),
        }
        let session_id = generate_session_id();
        if let Err(err) = self.store.set(&key, &session_id) {
            warn!(error = %err, chatbot_id, "failed to persist session id");
        }
        session_id
    }

    pub fn get_open_state(&self, session_id: &str) -> bool {
        self.read_open(session_id).unwrap_or(false)
    }

    /// Whether an open flag was ever written for this session.
    pub fn has_open_state(&self, session_id: &str) -> bool {
        self.read_open(session_id).is_some()
    }

    pub fn set_open_state(&self, session_id: &str, open: bool) {
        let value = if open { "true" } else { "false" };
        if let Err(err) = self.store.set(&open_key(session_id), value) {
            warn!(error = %err, session_id, "failed to save open state");
        }
    }

    /// Forgets the stored history and open flag. The session id itself is kept.
    pub fn clear(&self, session_id: &str) {
        for key in [messages_key(session_id), open_key(session_id)] {
            if let Err(err) = self.store.remove(&key) {
                warn!(error = %err, session_id, key = %key, "failed to clear stored state");
            }
        }
    }

    fn read_open(&self, session_id: &str) -> Option<bool> {
        match self.store.get(&open_key(session_id)) {
            Ok(value) => value.map(|value| value == "true"),
            Err(err) => {
                warn!(error = %err, session_id, "failed to read open state");
                None
            }
        }
    }
}

/// `session_{unix_millis}_{9 base36 chars}`. Best-effort unique within one storage.
pub fn generate_session_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let mut rng = rand::rng();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SESSION_ID_ALPHABET.len());
            SESSION_ID_ALPHABET[idx] as char
        })
        .collect();
    format!("session_{millis}_{suffix}")
}
