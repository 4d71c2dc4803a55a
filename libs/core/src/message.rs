use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Bot,
    User,
}

/// Conversation entry as shown in the window and stored in durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub thinking: bool,
}

impl Message {
    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            thinking: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            thinking: false,
        }
    }

    /// Placeholder shown while a webhook reply is pending.
    pub fn thinking() -> Self {
        Self {
            role: Role::Bot,
            content: String::new(),
            thinking: true,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.role == Role::Bot
    }
}

/// Removes every thinking placeholder. Filters on the marker, so it is safe after the list
/// changed underneath a pending request.
pub fn strip_thinking(messages: &mut Vec<Message>) {
    messages.retain(|message| !message.thinking);
}

pub fn thinking_count(messages: &[Message]) -> usize {
    messages.iter().filter(|message| message.thinking).count()
}
