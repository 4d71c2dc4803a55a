use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    pub bind: SocketAddr,
    /// JSON array of chatbot records. `None` starts with an empty directory.
    pub chatbots_file: Option<PathBuf>,
    pub webhook_timeout: Duration,
}

impl RouterConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = lookup("BIND").unwrap_or_else(|| DEFAULT_BIND.into());
        let bind: SocketAddr = bind
            .parse()
            .with_context(|| format!("invalid BIND address {bind:?}"))?;
        let chatbots_file = lookup("CHATBOTS_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let webhook_timeout = match lookup("WEBHOOK_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| format!("WEBHOOK_TIMEOUT_SECS must be a positive integer, got {raw:?}"))?,
            None => DEFAULT_WEBHOOK_TIMEOUT_SECS,
        };

        Ok(Self {
            bind,
            chatbots_file,
            webhook_timeout: Duration::from_secs(webhook_timeout),
        })
    }
}
