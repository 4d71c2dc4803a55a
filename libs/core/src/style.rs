//! Stylesheet generation. Every rule is scoped under the root container id so the widget
//! never restyles the host page.
use std::fmt::Write as _;

use crate::config::{Config, Theme};

pub const ROOT_ID: &str = "chatbot-widget";
const EDGE_MARGIN: u32 = 20;
const GAP: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl Corner {
    /// Unknown tokens fall back to bottom-right.
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "bottom-left" => Self::BottomLeft,
            "top-right" => Self::TopRight,
            "top-left" => Self::TopLeft,
            _ => Self::BottomRight,
        }
    }

    fn is_right(self) -> bool {
        matches!(self, Self::BottomRight | Self::TopRight)
    }

    fn is_bottom(self) -> bool {
        matches!(self, Self::BottomRight | Self::BottomLeft)
    }
}

/// CSS length for a bubble radius token; unknown tokens are fully rounded.
pub fn border_radius(token: &str) -> &'static str {
    match token.trim() {
        "none" => "0px",
        "sm" => "4px",
        "md" => "8px",
        "lg" => "12px",
        "xl" => "16px",
        _ => "50%",
    }
}

/// Fixed anchoring of the root container for the configured corner.
pub fn anchor(theme: &Theme) -> String {
    let corner = Corner::parse(&theme.bubble_position);
    let horizontal = if corner.is_right() { "right" } else { "left" };
    let vertical = if corner.is_bottom() { "bottom" } else { "top" };
    let h_offset = if corner.is_right() {
        theme.right_position
    } else {
        EDGE_MARGIN
    };
    let v_offset = if corner.is_bottom() {
        theme.bottom_position
    } else {
        EDGE_MARGIN
    };
    format!("{vertical}: {v_offset}px; {horizontal}: {h_offset}px;")
}

/// Popup window placement relative to the bubble.
pub fn window_offset(theme: &Theme) -> String {
    let corner = Corner::parse(&theme.bubble_position);
    let horizontal = if corner.is_right() { "right" } else { "left" };
    let vertical = if corner.is_bottom() { "bottom" } else { "top" };
    format!(
        "{vertical}: {}px; {horizontal}: 0;",
        theme.bubble_size + GAP
    )
}

/// Tooltip sits beside the bubble, on the side facing the page.
pub fn tooltip_offset(theme: &Theme) -> String {
    let corner = Corner::parse(&theme.bubble_position);
    let side = if corner.is_right() { "right" } else { "left" };
    format!(
        "{side}: {}px; bottom: 50%; transform: translateY(50%);",
        theme.bubble_size + GAP
    )
}

pub fn stylesheet(config: &Config) -> String {
    let t = &config.theme;
    let root = format!("#{ROOT_ID}");
    let mut css = String::with_capacity(4096);

    let _ = writeln!(
        css,
        "{root} {{ z-index: 9999; font-family: system-ui, -apple-system, sans-serif; font-size: {}px; }}",
        t.font_size
    );
    let _ = writeln!(css, "{root} * {{ box-sizing: border-box; }}");
    let _ = writeln!(
        css,
        "{root} .cw-bubble {{ width: {size}px; height: {size}px; background: {bg}; color: {fg}; border: none; border-radius: {radius}; cursor: pointer; display: flex; align-items: center; justify-content: center; box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15); transition: transform 0.2s ease; position: relative; }}",
        size = t.bubble_size,
        bg = t.bubble_color,
        fg = t.bubble_text_color,
        radius = border_radius(&t.bubble_border_radius),
    );
    let _ = writeln!(css, "{root} .cw-bubble:hover {{ transform: scale(1.05); }}");
    let _ = writeln!(
        css,
        "{root} .cw-bubble img {{ width: {}%; height: {}%; object-fit: contain; }}",
        t.custom_icon_size, t.custom_icon_size
    );
    let _ = writeln!(
        css,
        "{root} .cw-tooltip {{ position: absolute; background: {}; color: {}; padding: 12px 16px; border-radius: 8px; font-size: {}px; max-width: 220px; white-space: normal; box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15); transition: opacity 0.3s ease; {} }}",
        t.tooltip_background_color,
        t.tooltip_text_color,
        t.tooltip_font_size,
        tooltip_offset(t),
    );
    let _ = writeln!(
        css,
        "{root} .cw-tooltip[hidden] {{ display: none; }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-window {{ background: {}; border-radius: {}px; box-shadow: 0 10px 30px rgba(0, 0, 0, 0.2); display: flex; flex-direction: column; overflow: hidden; }}",
        t.window_background_color, t.window_border_radius,
    );
    let _ = writeln!(
        css,
        "{root} .cw-window.cw-overlay {{ position: absolute; {} }}",
        window_offset(t)
    );
    let _ = writeln!(
        css,
        "{root} .cw-window.cw-inline {{ position: relative; box-shadow: none; }}"
    );
    let _ = writeln!(css, "{root} .cw-window[hidden] {{ display: none; }}");
    let _ = writeln!(
        css,
        "{root} .cw-header {{ display: flex; align-items: center; justify-content: space-between; gap: 8px; padding: 12px 16px; background: {}; color: {}; user-select: none; }}",
        t.bubble_color, t.window_text_color,
    );
    let _ = writeln!(
        css,
        "{root} .cw-header.cw-draggable {{ cursor: move; }}"
    );
    let _ = writeln!(css, "{root} .cw-actions {{ display: flex; gap: 4px; }}");
    let _ = writeln!(
        css,
        "{root} .cw-header button {{ background: transparent; border: none; color: inherit; cursor: pointer; padding: 4px; }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-avatar {{ width: {size}px; height: {size}px; border-radius: {}%; object-fit: cover; flex-shrink: 0; }}",
        t.avatar_border_radius,
        size = t.avatar_size,
    );
    let overflow = if t.show_scrollbar {
        "scrollbar-width: auto;"
    } else {
        "scrollbar-width: none;"
    };
    let _ = writeln!(
        css,
        "{root} .cw-messages {{ flex: 1; overflow-y: auto; padding: 16px; display: flex; flex-direction: column; gap: 12px; {overflow} }}"
    );
    if !t.show_scrollbar {
        let _ = writeln!(
            css,
            "{root} .cw-messages::-webkit-scrollbar {{ display: none; }}"
        );
    }
    let _ = writeln!(
        css,
        "{root} .cw-row {{ display: flex; gap: 8px; align-items: flex-end; }}"
    );
    let _ = writeln!(css, "{root} .cw-row.cw-user {{ justify-content: flex-end; }}");
    let _ = writeln!(
        css,
        "{root} .cw-message {{ max-width: 80%; padding: 10px 14px; border-radius: {}px; word-wrap: break-word; white-space: pre-wrap; }}",
        t.message_border_radius
    );
    let _ = writeln!(
        css,
        "{root} .cw-bot .cw-message {{ background: {}; color: {}; }}",
        t.bot_message_background_color, t.bot_message_text_color
    );
    let _ = writeln!(
        css,
        "{root} .cw-user .cw-message {{ background: {}; color: {}; }}",
        t.user_message_background_color, t.user_message_text_color
    );
    let _ = writeln!(
        css,
        "{root} .cw-thinking span {{ display: inline-block; width: 6px; height: 6px; margin: 0 2px; border-radius: 50%; background: currentColor; animation: cw-pulse 1.4s infinite ease-in-out both; }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-thinking span:nth-child(2) {{ animation-delay: 0.16s; }} {root} .cw-thinking span:nth-child(3) {{ animation-delay: 0.32s; }}"
    );
    let _ = writeln!(
        css,
        "@keyframes cw-pulse {{ 0%, 80%, 100% {{ opacity: 0.3; }} 40% {{ opacity: 1; }} }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-copy {{ background: transparent; border: none; cursor: pointer; font-size: 12px; opacity: 0.6; }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-starters {{ display: flex; flex-wrap: wrap; gap: 8px; padding: 0 16px 8px; }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-starter {{ border: 1px solid {}; color: {}; background: transparent; border-radius: 16px; padding: 6px 12px; cursor: pointer; font-size: 13px; }}",
        t.send_button_color, t.send_button_color
    );
    let _ = writeln!(
        css,
        "{root} .cw-input-area {{ display: flex; gap: 8px; align-items: flex-end; padding: 12px 16px; border-top: 1px solid #e5e7eb; }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-textarea {{ flex: 1; resize: none; border: 1px solid #e5e7eb; padding: 8px 12px; font: inherit; line-height: 1.5; background: {}; color: {}; border-radius: {}px; max-height: {}px; }}",
        t.text_input_background_color,
        t.text_input_text_color,
        t.text_input_border_radius,
        t.input_max_height,
    );
    let _ = writeln!(
        css,
        "{root} .cw-send {{ background: {}; color: #ffffff; border: none; border-radius: {}px; width: 40px; height: 40px; cursor: pointer; display: flex; align-items: center; justify-content: center; }}",
        t.send_button_color, t.send_button_border_radius
    );
    let _ = writeln!(css, "{root} .cw-send:disabled {{ opacity: 0.5; cursor: not-allowed; }}");
    let _ = writeln!(
        css,
        "{root} .cw-counter {{ font-size: 11px; color: #6b7280; padding: 0 16px 6px; text-align: right; }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-counter.cw-over {{ color: #dc2626; }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-warning {{ font-size: 12px; color: #dc2626; padding: 0 16px 6px; }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-footer {{ text-align: center; padding: 8px 16px; font-size: 12px; background: {}; color: {}; border-top: 1px solid #e5e7eb; }}",
        t.footer_background_color, t.footer_text_color
    );
    let _ = writeln!(
        css,
        "{root} .cw-footer a {{ color: inherit; text-decoration: underline; }}"
    );
    let _ = writeln!(
        css,
        "{root} .cw-resize-handle {{ position: absolute; top: 0; left: 0; width: 14px; height: 14px; cursor: nwse-resize; z-index: 1; }}"
    );

    if !t.custom_css.trim().is_empty() {
        css.push_str(&t.custom_css);
        if !t.custom_css.ends_with('\n') {
            css.push('\n');
        }
    }
    css
}
