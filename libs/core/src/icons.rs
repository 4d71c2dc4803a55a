//! Inline SVG markup for the widget's named icons.

const SVG_OPEN: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">"#;

const BOT: &str = r#"<path d="M12 8V4H8"/><rect width="16" height="12" x="4" y="8" rx="2"/><path d="M2 14h2"/><path d="M20 14h2"/><path d="M15 13v2"/><path d="M9 13v2"/>"#;
const MESSAGE_CIRCLE: &str = r#"<path d="M7.9 20A9 9 0 1 0 4 16.1L2 22Z"/>"#;
const CLOSE: &str = r#"<path d="M18 6 6 18"/><path d="m6 6 12 12"/>"#;
const SEND: &str = r#"<path d="m22 2-7 20-4-9-9-4Z"/><path d="M22 2 11 13"/>"#;
const ROTATE_CCW: &str =
    r#"<path d="M3 12a9 9 0 1 0 9-9 9.75 9.75 0 0 0-6.74 2.74L3 8"/><path d="M3 3v5h5"/>"#;
const CLOSE_WINDOW: &str = r#"<rect width="18" height="18" x="3" y="3" rx="2"/><path d="m15 9-6 6"/><path d="m9 9 6 6"/>"#;

/// Markup for `name`; unknown names render nothing.
///
/// Accepts kebab-case (`message-circle`) and PascalCase (`MessageCircle`).
pub fn icon(name: &str) -> String {
    let body = match kebab(name).as_str() {
        "bot" => BOT,
        "message-circle" => MESSAGE_CIRCLE,
        "close" | "x" => CLOSE,
        "send" => SEND,
        "rotate-ccw" => ROTATE_CCW,
        "close-window" => CLOSE_WINDOW,
        _ => return String::new(),
    };
    format!("{SVG_OPEN}{body}</svg>")
}

fn kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, ch) in name.trim().chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if idx > 0 && !out.ends_with('-') {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '_' || ch == ' ' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_icons_render_svg() {
        for name in [
            "bot",
            "message-circle",
            "close",
            "send",
            "rotate-ccw",
            "close-window",
        ] {
            let markup = icon(name);
            assert!(markup.starts_with("<svg"), "{name}");
            assert!(markup.ends_with("</svg>"), "{name}");
        }
    }

    #[test]
    fn pascal_case_names_resolve() {
        assert_eq!(icon("MessageCircle"), icon("message-circle"));
        assert_eq!(icon("RotateCcw"), icon("rotate-ccw"));
        assert_eq!(icon("Bot"), icon("bot"));
    }

    #[test]
    fn unknown_icon_is_empty() {
        assert_eq!(icon("unicorn"), "");
        assert_eq!(icon(""), "");
    }
}
