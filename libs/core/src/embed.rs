//! Embed snippet handed to site owners.
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use crate::config::{Mode, WidgetOptions};

pub const DEFAULT_SCRIPT_URL: &str = "./chatbot-embed.js";

/// Script tag loading the runtime followed by a `Chatbot.init({...})` call.
///
/// `mode` and `containerId` are only emitted for inline widgets.
pub fn embed_snippet(script_url: &str, options: &WidgetOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<script src={}></script>", json(&script_url));
    out.push_str("<script>\nChatbot.init({\n");
    let _ = writeln!(out, "  chatbotId: {},", json(&options.chatbot_id));
    let _ = writeln!(out, "  routingUrl: {},", json(&options.routing_url));
    if options.mode == Mode::Inpage {
        let _ = writeln!(out, "  mode: {},", json(&options.mode));
        if let Some(container_id) = &options.container_id {
            let _ = writeln!(out, "  containerId: {},", json(container_id));
        }
    }
    let _ = writeln!(out, "  metadata: {},", json(&options.metadata));
    let theme = serde_json::to_string_pretty(&Value::Object(options.theme.clone()))
        .unwrap_or_else(|_| "{}".to_string());
    let _ = writeln!(out, "  theme: {theme}");
    out.push_str("});\n</script>");
    out
}

fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snippet_loads_script_and_calls_init() {
        let options = WidgetOptions {
            chatbot_id: "bot-1".into(),
            routing_url: "https://route.example/chat".into(),
            theme: json!({ "bubbleColor": "#000" }).as_object().cloned().unwrap(),
            ..WidgetOptions::default()
        };
        let snippet = embed_snippet(DEFAULT_SCRIPT_URL, &options);
        assert!(snippet.starts_with("<script src=\"./chatbot-embed.js\"></script>\n<script>"));
        assert!(snippet.contains("  chatbotId: \"bot-1\",\n"));
        assert!(snippet.contains("  metadata: {},\n"));
        assert!(snippet.contains("  theme: {\n  \"bubbleColor\": \"#000\"\n}\n"));
        assert!(!snippet.contains("mode:"));
        assert!(snippet.ends_with("});\n</script>"));
    }

    #[test]
    fn inline_snippet_names_container() {
        let options = WidgetOptions {
            chatbot_id: "bot-1".into(),
            mode: Mode::Inpage,
            container_id: Some("help-pane".into()),
            ..WidgetOptions::default()
        };
        let snippet = embed_snippet("https://cdn.example/w.js", &options);
        assert!(snippet.contains("  mode: \"inpage\",\n  containerId: \"help-pane\",\n"));
    }

    #[test]
    fn values_are_json_quoted() {
        let options = WidgetOptions {
            chatbot_id: "a\"b".into(),
            ..WidgetOptions::default()
        };
        assert!(embed_snippet(DEFAULT_SCRIPT_URL, &options).contains(r#"chatbotId: "a\"b","#));
    }
}
