//! Layered configuration for the widget.
//!
//! Precedence, highest first: legacy alias, explicit user value, built-in default.
//! Theme overrides replace a default key wholesale; nested values are never merged.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::warn;

/// Container id looked up on the host page in inline mode when none is given.
pub const DEFAULT_CONTAINER_ID: &str = "chatbot-container";

/// Legacy theme key and the canonical key it overwrites.
pub const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("titleText", "windowTitle"),
    ("titleTextColor", "windowTextColor"),
    ("backgroundColor", "bubbleColor"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Floating bubble with a popup window.
    #[default]
    Bubble,
    /// Window rendered inside a host element.
    Inpage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Number(Number),
}

/// Options as passed to `init` by the embedding page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOptions {
    #[serde(default)]
    pub chatbot_id: String,
    #[serde(default)]
    pub routing_url: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub theme: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    // bubble
    pub bubble_icon: String,
    pub bubble_size: u32,
    pub bubble_position: String,
    pub bubble_color: String,
    pub bubble_text_color: String,
    pub bubble_border_radius: String,
    pub custom_icon_url: String,
    pub custom_icon_size: u32,
    pub right_position: u32,
    pub bottom_position: u32,
    pub auto_open_bot: bool,
    /// Seconds.
    pub open_delay: f64,

    // tooltip
    pub show_tooltip: bool,
    pub tooltip_text: String,
    pub tooltip_background_color: String,
    pub tooltip_text_color: String,
    pub tooltip_font_size: u32,

    // window
    pub window_title: String,
    pub window_icon: String,
    pub show_title_section: bool,
    pub window_background_color: String,
    pub window_text_color: String,
    pub window_border_radius: u32,
    pub window_width: u32,
    pub window_height: u32,
    pub min_window_width: u32,
    pub min_window_height: u32,
    pub max_window_width: Option<u32>,
    pub max_window_height: Option<u32>,
    pub avatar_size: u32,
    pub avatar_border_radius: u32,
    pub message_border_radius: u32,
    pub welcome_message: String,
    pub custom_error_message: String,
    pub starter_prompts: Vec<String>,
    pub render_html: bool,
    pub clear_chat_on_reload: bool,
    pub show_scrollbar: bool,
    pub font_size: u32,
    pub enable_drag: bool,
    pub enable_resize: bool,

    // messages
    pub bot_message_background_color: String,
    pub bot_message_text_color: String,
    pub show_bot_avatar: bool,
    pub bot_avatar_url: String,
    pub show_copy_to_clipboard: bool,
    pub user_message_background_color: String,
    pub user_message_text_color: String,
    pub show_user_avatar: bool,
    pub user_avatar_url: String,

    // text input
    pub text_input_border_radius: u32,
    pub placeholder_text: String,
    pub text_input_background_color: String,
    pub text_input_text_color: String,
    pub send_button_color: String,
    pub send_button_border_radius: u32,
    pub max_characters: usize,
    pub show_character_warning: bool,
    pub max_characters_warning: String,
    pub auto_focus_input: bool,
    pub input_max_height: u32,

    // footer
    pub show_footer: bool,
    pub footer_text: String,
    pub footer_link: String,
    pub footer_background_color: String,
    pub footer_text_color: String,

    #[serde(rename = "customCSS")]
    pub custom_css: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bubble_icon: "MessageCircle".into(),
            bubble_size: 60,
            bubble_position: "bottom-right".into(),
            bubble_color: "#3b82f6".into(),
            bubble_text_color: "#ffffff".into(),
            bubble_border_radius: "full".into(),
            custom_icon_url: String::new(),
            custom_icon_size: 60,
            right_position: 20,
            bottom_position: 20,
            auto_open_bot: false,
            open_delay: 3.0,

            show_tooltip: true,
            tooltip_text: "Hi there! 👋 How can I help you today?".into(),
            tooltip_background_color: "#1f2937".into(),
            tooltip_text_color: "#ffffff".into(),
            tooltip_font_size: 14,

            window_title: "Chat with us".into(),
            window_icon: "Bot".into(),
            show_title_section: true,
            window_background_color: "#ffffff".into(),
            window_text_color: "#ffffff".into(),
            window_border_radius: 16,
            window_width: 400,
            window_height: 600,
            min_window_width: 280,
            min_window_height: 300,
            max_window_width: None,
            max_window_height: None,
            avatar_size: 40,
            avatar_border_radius: 50,
            message_border_radius: 12,
            welcome_message: "Hello! How can I help you today?".into(),
            custom_error_message:
                "I'm sorry. Something has gone wrong. Please try asking your question again."
                    .into(),
            starter_prompts: Vec::new(),
            render_html: false,
            clear_chat_on_reload: false,
            show_scrollbar: true,
            font_size: 14,
            enable_drag: true,
            enable_resize: true,

            bot_message_background_color: "#f3f4f6".into(),
            bot_message_text_color: "#111827".into(),
            show_bot_avatar: true,
            bot_avatar_url: String::new(),
            show_copy_to_clipboard: false,
            user_message_background_color: "#3b82f6".into(),
            user_message_text_color: "#ffffff".into(),
            show_user_avatar: false,
            user_avatar_url: String::new(),

            text_input_border_radius: 8,
            placeholder_text: "Type your message...".into(),
            text_input_background_color: "#ffffff".into(),
            text_input_text_color: "#111827".into(),
            send_button_color: "#3b82f6".into(),
            send_button_border_radius: 8,
            max_characters: 1000,
            show_character_warning: true,
            max_characters_warning: "Character limit exceeded".into(),
            auto_focus_input: false,
            input_max_height: 120,

            show_footer: true,
            footer_text: "Powered by n8n".into(),
            footer_link: "https://n8n.io".into(),
            footer_background_color: "#ffffff".into(),
            footer_text_color: "#6b7280".into(),

            custom_css: String::new(),
        }
    }
}

impl Theme {
    /// Theme as a flat JSON object keyed by canonical option names.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Normalized configuration. Built once per page load and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub chatbot_id: String,
    pub routing_url: String,
    pub metadata: BTreeMap<String, MetadataValue>,
    pub mode: Mode,
    pub container_id: String,
    pub theme: Theme,
    extra: Map<String, Value>,
}

impl Config {
    pub fn is_inline(&self) -> bool {
        self.mode == Mode::Inpage
    }

    /// Webhook endpoint `{routingUrl}/{chatbotId}`, if both parts are set.
    pub fn endpoint(&self) -> Option<String> {
        let base = self.routing_url.trim().trim_end_matches('/');
        let id = self.chatbot_id.trim();
        if base.is_empty() || id.is_empty() {
            return None;
        }
        Some(format!("{base}/{id}"))
    }

    /// Looks up a theme option by name. Legacy names resolve to their canonical key.
    pub fn option(&self, name: &str) -> Option<Value> {
        let canonical = canonical_key(name);
        self.theme
            .to_map()
            .remove(canonical)
            .or_else(|| self.extra.get(name).cloned())
    }

    /// Theme keys that were supplied but are not known options.
    pub fn unknown_options(&self) -> impl Iterator<Item = &str> {
        self.extra
            .keys()
            .map(String::as_str)
            .filter(|key| !LEGACY_ALIASES.iter().any(|(legacy, _)| legacy == key))
    }
}

pub fn canonical_key(name: &str) -> &str {
    LEGACY_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name)
}

/// Merges `options` over `defaults`.
///
/// Values whose JSON type does not fit the option are dropped with a warning and the default
/// is kept. Normalization never fails.
pub fn normalize(defaults: &Theme, options: WidgetOptions) -> Config {
    let WidgetOptions {
        chatbot_id,
        routing_url,
        metadata,
        mode,
        container_id,
        theme: overrides,
    } = options;

    let base = defaults.to_map();
    let mut merged = base.clone();
    let mut extra = Map::new();

    for (key, value) in overrides {
        if !base.contains_key(&key) {
            extra.insert(key, value);
            continue;
        }
        if fits(&base, &key, &value) {
            merged.insert(key, value);
        } else {
            warn!(option = %key, value = %value, "ignoring theme option with unexpected type");
        }
    }

    for (legacy, canonical) in LEGACY_ALIASES {
        let Some(value) = extra.get(*legacy) else {
            continue;
        };
        if !is_set(value) {
            continue;
        }
        if fits(&base, canonical, value) {
            merged.insert((*canonical).to_string(), value.clone());
        } else {
            warn!(option = %legacy, value = %value, "ignoring legacy theme option with unexpected type");
        }
    }

    let theme = serde_json::from_value(Value::Object(merged)).unwrap_or_else(|err| {
        warn!(error = %err, "merged theme rejected; falling back to defaults");
        defaults.clone()
    });

    Config {
        chatbot_id,
        routing_url,
        metadata,
        mode,
        container_id: container_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTAINER_ID.to_string()),
        theme,
        extra,
    }
}

fn fits(base: &Map<String, Value>, key: &str, value: &Value) -> bool {
    let mut probe = base.clone();
    probe.insert(key.to_string(), value.clone());
    serde_json::from_value::<Theme>(Value::Object(probe)).is_ok()
}

// Legacy keys only take effect when truthy.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
