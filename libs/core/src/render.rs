//! Pure description of the widget UI.
//!
//! [`render`] maps configuration plus state to a [`View`]; the host applies it to the page.
//! The same inputs always produce the same view, so re-applying a view is idempotent.
use crate::{
    config::Config,
    geometry::Position,
    icons::icon,
    message::{Message, Role},
    state::WidgetState,
    style::{ROOT_ID, anchor, stylesheet},
};

pub const WINDOW_ID: &str = "chatbot-window";
pub const BUBBLE_ID: &str = "chatbot-bubble";
pub const TOOLTIP_ID: &str = "chatbot-tooltip";
pub const HEADER_ID: &str = "chatbot-header";
pub const MESSAGES_ID: &str = "chatbot-messages";
pub const INPUT_ID: &str = "chatbot-input";
pub const SEND_ID: &str = "chatbot-send";
pub const RESIZE_HANDLE_ID: &str = "chatbot-resize-handle";

const INPUT_PADDING: f64 = 16.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Trusted markup inserted as-is.
    Markup(String),
}

impl Node {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Markup(markup) => out.push_str(markup),
            Node::Element(element) => element.write_html(out),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    /// Boolean attribute, present only when `on`.
    pub fn flag(self, name: &'static str, on: bool) -> Self {
        if on { self.attr(name, "") } else { self }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn style(self, style: impl Into<String>) -> Self {
        self.attr("style", style)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn markup(self, markup: impl Into<String>) -> Self {
        self.child(Node::Markup(markup.into()))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    /// Depth-first search by `id`.
    pub fn find(&self, id: &str) -> Option<&Element> {
        if self.get_attr("id") == Some(id) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|child| child.find(id))
    }

    /// Depth-first search for every element carrying `class`.
    pub fn find_by_class<'a>(&'a self, class: &str, found: &mut Vec<&'a Element>) {
        if self
            .get_attr("class")
            .is_some_and(|value| value.split_whitespace().any(|c| c == class))
        {
            found.push(self);
        }
        for child in self.children.iter().filter_map(Node::as_element) {
            child.find_by_class(class, found);
        }
    }

    /// Concatenated text content.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => out.push_str(&element.text_content()),
                Node::Markup(_) => {}
            }
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if !value.is_empty() {
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
        }
        out.push('>');
        if is_void(self.tag) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(self.tag);
        out.push('>');
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "img" | "br" | "input")
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Where the root container is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mount {
    Body,
    Host(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub mount: Mount,
    pub root: Element,
    pub stylesheet: String,
}

impl View {
    pub fn to_html(&self) -> String {
        format!(
            "<style>{}</style>{}",
            self.stylesheet,
            Node::from(self.root.clone()).to_html()
        )
    }

    pub fn find(&self, id: &str) -> Option<&Element> {
        self.root.find(id)
    }
}

pub fn render(config: &Config, state: &WidgetState) -> View {
    let inline = config.is_inline();
    let mut root = Element::new("div").id(ROOT_ID);

    if inline {
        root = root
            .style("position: relative; width: 100%; height: 100%;")
            .child(window(config, state));
        return View {
            mount: Mount::Host(config.container_id.clone()),
            root,
            stylesheet: stylesheet(config),
        };
    }

    let placement = match state.frame.position {
        Position::Anchored => anchor(&config.theme),
        Position::Absolute { left, top } => {
            format!("left: {left}px; top: {top}px; right: auto; bottom: auto;")
        }
    };
    root = root.style(format!("position: fixed; {placement}"));
    if config.theme.show_tooltip {
        root = root.child(tooltip(config, state));
    }
    root = root.child(window(config, state)).child(bubble(config, state));

    View {
        mount: Mount::Body,
        root,
        stylesheet: stylesheet(config),
    }
}

fn tooltip(config: &Config, state: &WidgetState) -> Element {
    Element::new("div")
        .id(TOOLTIP_ID)
        .class("cw-tooltip")
        .attr("role", "tooltip")
        .flag("hidden", !state.tooltip_visible || state.open)
        .text(config.theme.tooltip_text.clone())
}

fn bubble(config: &Config, state: &WidgetState) -> Element {
    let t = &config.theme;
    let button = Element::new("button")
        .id(BUBBLE_ID)
        .class("cw-bubble")
        .attr("type", "button")
        .attr("data-action", "toggle")
        .attr(
            "aria-label",
            if state.open { "Close chat" } else { "Open chat" },
        );
    if state.open {
        return button.markup(icon("close"));
    }
    if !t.custom_icon_url.trim().is_empty() {
        return button.child(
            Element::new("img")
                .attr("src", t.custom_icon_url.clone())
                .attr("alt", ""),
        );
    }
    let mut markup = icon(&t.bubble_icon);
    if markup.is_empty() {
        markup = icon("message-circle");
    }
    button.markup(markup)
}

fn window(config: &Config, state: &WidgetState) -> Element {
    let t = &config.theme;
    let inline = config.is_inline();
    let mut window = Element::new("div").id(WINDOW_ID);
    if inline {
        window = window
            .class("cw-window cw-inline")
            .style(format!("width: 100%; height: {}px;", t.window_height));
    } else {
        window = window
            .class("cw-window cw-overlay")
            .style(format!(
                "width: {}px; height: {}px;",
                state.frame.width, state.frame.height
            ))
            .flag("hidden", !state.open);
        if t.enable_resize {
            window = window.child(
                Element::new("div")
                    .id(RESIZE_HANDLE_ID)
                    .class("cw-resize-handle")
                    .attr("data-action", "resize"),
            );
        }
    }

    if t.show_title_section {
        window = window.child(header(config));
    }
    window = window.child(messages(config, state));
    if state.shows_starter_prompts() && !t.starter_prompts.is_empty() {
        window = window.child(starter_prompts(config));
    }
    if state.over_limit && t.show_character_warning {
        window = window.child(
            Element::new("div")
                .class("cw-warning")
                .attr("role", "alert")
                .text(t.max_characters_warning.clone()),
        );
    }
    window = window.child(input_area(config, state));
    window = window.child(counter(config, state));
    if t.show_footer && !t.footer_text.trim().is_empty() {
        window = window.child(footer(config));
    }
    window
}

fn header(config: &Config) -> Element {
    let t = &config.theme;
    let draggable = !config.is_inline() && t.enable_drag;
    let mut title = Element::new("div")
        .class("cw-title")
        .style("display: flex; align-items: center; gap: 8px;");
    if t.show_bot_avatar && !t.bot_avatar_url.trim().is_empty() {
        title = title.child(avatar(&t.bot_avatar_url, "Bot avatar"));
    } else {
        title = title.child(Element::new("span").class("cw-icon").markup(icon(&t.window_icon)));
    }
    title = title.child(
        Element::new("h3")
            .style("margin: 0; font-size: 16px; font-weight: 600;")
            .text(t.window_title.clone()),
    );

    let mut actions = Element::new("div").class("cw-actions").child(
        Element::new("button")
            .attr("type", "button")
            .attr("data-action", "clear")
            .attr("title", "Clear chat")
            .markup(icon("rotate-ccw")),
    );
    if !config.is_inline() {
        actions = actions.child(
            Element::new("button")
                .attr("type", "button")
                .attr("data-action", "close")
                .attr("title", "Close")
                .markup(icon("close-window")),
        );
    }

    Element::new("div")
        .id(HEADER_ID)
        .class(if draggable {
            "cw-header cw-draggable"
        } else {
            "cw-header"
        })
        .child(title)
        .child(actions)
}

fn avatar(url: &str, alt: &str) -> Element {
    Element::new("img")
        .class("cw-avatar")
        .attr("src", url)
        .attr("alt", alt)
}

fn messages(config: &Config, state: &WidgetState) -> Element {
    let mut list = Element::new("div")
        .id(MESSAGES_ID)
        .class("cw-messages")
        .attr("aria-live", "polite");
    for (index, message) in state.messages.iter().enumerate() {
        list = list.child(message_row(config, index, message));
    }
    list
}

fn message_row(config: &Config, index: usize, message: &Message) -> Element {
    let t = &config.theme;
    let (row_class, avatar_url, show_avatar) = match message.role {
        Role::Bot => ("cw-row cw-bot", &t.bot_avatar_url, t.show_bot_avatar),
        Role::User => ("cw-row cw-user", &t.user_avatar_url, t.show_user_avatar),
    };
    let mut row = Element::new("div")
        .class(row_class)
        .attr("data-index", index.to_string());
    let avatar_node = (show_avatar && !avatar_url.trim().is_empty()).then(|| {
        avatar(
            avatar_url,
            if message.is_bot() {
                "Bot avatar"
            } else {
                "User avatar"
            },
        )
    });

    if message.is_bot()
        && let Some(avatar) = avatar_node.clone()
    {
        row = row.child(avatar);
    }

    let bubble = if message.thinking {
        Element::new("div")
            .class("cw-message cw-thinking")
            .attr("aria-label", "Thinking")
            .child(Element::new("span"))
            .child(Element::new("span"))
            .child(Element::new("span"))
    } else if message.is_bot() && t.render_html {
        Element::new("div")
            .class("cw-message")
            .markup(message.content.clone())
    } else {
        Element::new("div")
            .class("cw-message")
            .text(message.content.clone())
    };
    row = row.child(bubble);

    if message.is_bot() && !message.thinking && t.show_copy_to_clipboard {
        row = row.child(
            Element::new("button")
                .class("cw-copy")
                .attr("type", "button")
                .attr("data-action", "copy")
                .attr("data-index", index.to_string())
                .text("Copy"),
        );
    }
    if !message.is_bot()
        && let Some(avatar) = avatar_node
    {
        row = row.child(avatar);
    }
    row
}

fn starter_prompts(config: &Config) -> Element {
    let mut list = Element::new("div").class("cw-starters");
    for (index, prompt) in config.theme.starter_prompts.iter().enumerate() {
        list = list.child(
            Element::new("button")
                .class("cw-starter")
                .attr("type", "button")
                .attr("data-action", "starter")
                .attr("data-index", index.to_string())
                .text(prompt.clone()),
        );
    }
    list
}

/// Textarea height for the current buffer and whether it has hit the cap and scrolls.
pub fn input_height(config: &Config, input: &str) -> (f64, bool) {
    let t = &config.theme;
    let lines = input.split('\n').count().max(1) as f64;
    let line_height = f64::from(t.font_size) * 1.5;
    let natural = lines * line_height + INPUT_PADDING;
    let cap = f64::from(t.input_max_height);
    if natural > cap {
        (cap, true)
    } else {
        (natural, false)
    }
}

fn input_area(config: &Config, state: &WidgetState) -> Element {
    let t = &config.theme;
    let (height, scrolls) = input_height(config, &state.input);
    let textarea = Element::new("textarea")
        .id(INPUT_ID)
        .class("cw-textarea")
        .attr("rows", "1")
        .attr("placeholder", t.placeholder_text.clone())
        .style(format!(
            "height: {height}px; overflow-y: {};",
            if scrolls { "auto" } else { "hidden" }
        ))
        .flag("autofocus", state.input_focused)
        .text(state.input.clone());
    let send = Element::new("button")
        .id(SEND_ID)
        .class("cw-send")
        .attr("type", "button")
        .attr("data-action", "send")
        .attr("aria-label", "Send message")
        .flag("disabled", state.input.trim().is_empty() || state.over_limit)
        .markup(icon("send"));
    Element::new("div")
        .class("cw-input-area")
        .child(textarea)
        .child(send)
}

fn counter(config: &Config, state: &WidgetState) -> Element {
    Element::new("div")
        .class(if state.over_limit {
            "cw-counter cw-over"
        } else {
            "cw-counter"
        })
        .text(format!(
            "{}/{}",
            state.char_count(),
            config.theme.max_characters
        ))
}

fn footer(config: &Config) -> Element {
    let t = &config.theme;
    let footer = Element::new("div").class("cw-footer");
    if t.footer_link.trim().is_empty() {
        return footer.markup(t.footer_text.clone());
    }
    footer.child(
        Element::new("a")
            .attr("href", t.footer_link.clone())
            .attr("target", "_blank")
            .attr("rel", "noopener noreferrer")
            .markup(t.footer_text.clone()),
    )
}
