use crate::{config::Config, geometry::Frame, message::Message};

/// In-memory widget state. Only `open` and `messages` are persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    pub open: bool,
    pub messages: Vec<Message>,
    pub input: String,
    /// Input is longer than `maxCharacters`.
    pub over_limit: bool,
    pub tooltip_visible: bool,
    /// Set once the deferred auto-focus fired while open; cleared on close.
    pub input_focused: bool,
    pub frame: Frame,
}

impl WidgetState {
    pub fn new(config: &Config) -> Self {
        Self {
            open: config.is_inline(),
            messages: vec![welcome(config)],
            input: String::new(),
            over_limit: false,
            tooltip_visible: false,
            input_focused: false,
            frame: Frame::from_theme(&config.theme),
        }
    }

    pub fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    /// Starter prompts are offered until the visitor says something.
    pub fn shows_starter_prompts(&self) -> bool {
        self.messages.len() == 1
    }
}

pub fn welcome(config: &Config) -> Message {
    Message::bot(config.theme.welcome_message.clone())
}
