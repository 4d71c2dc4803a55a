//! Interaction state machine.
//!
//! The controller owns [`WidgetState`] and applies one [`Event`] at a time. Anything that has
//! to happen later (timers, webhook round trips) is returned as an [`Effect`] for the caller to
//! run; the result comes back as another event.
use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    geometry::{DragSession, Point, ResizeSession, SizeLimits},
    message::{Message, strip_thinking},
    render::{View, render},
    state::{WidgetState, welcome},
    storage::Persistence,
    webhook::{WebhookError, WebhookReply, build_payload},
};

/// Delay between opening the window and focusing the input.
pub const FOCUS_DELAY: Duration = Duration::from_millis(100);

/// What a pointer press landed on inside the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTarget {
    Header,
    /// Any button, including those inside the header.
    Button,
    ResizeHandle,
}

#[derive(Debug)]
pub enum Event {
    BubbleClicked,
    CloseClicked,
    Toggle,
    BubbleHovered,
    BubbleLeft,
    InputChanged(String),
    KeyPressed {
        key: String,
        shift: bool,
    },
    SendClicked,
    /// Programmatic send of `text`, bypassing the input buffer.
    Send(String),
    StarterPromptClicked(usize),
    /// Copy button on the message at this index.
    CopyClicked(usize),
    ClearChat,
    PointerDown {
        target: PressTarget,
        pointer: Point,
        root_origin: Point,
    },
    PointerMoved(Point),
    PointerReleased,
    AutoOpenElapsed,
    AutoFocusElapsed,
    /// Page restored from the back-forward cache.
    Resumed,
    ReplyReceived {
        request_id: u64,
        outcome: Result<WebhookReply, WebhookError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub request_id: u64,
    pub endpoint: String,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScheduleAutoOpen(Duration),
    ScheduleFocus(Duration),
    Deliver(Delivery),
    CopyToClipboard(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    Dragging(DragSession),
    Resizing(ResizeSession),
}

pub struct Controller {
    config: Arc<Config>,
    persistence: Persistence,
    session_id: String,
    state: WidgetState,
    gesture: Gesture,
    next_request_id: u64,
    outstanding: Option<u64>,
}

impl Controller {
    /// Resolves the session, restores persisted messages and open state, and returns the
    /// effects needed to finish start-up.
    pub fn new(config: Arc<Config>, persistence: Persistence) -> (Self, Vec<Effect>) {
        let session_id = persistence.get_or_create_session(&config.chatbot_id);
        let mut state = WidgetState::new(&config);
        let mut effects = Vec::new();

        if config.theme.clear_chat_on_reload {
            persistence.clear(&session_id);
        } else {
            let mut restored = persistence.load_messages(&session_id);
            strip_thinking(&mut restored);
            if !restored.is_empty() {
                state.messages = restored;
            }
        }

        if !config.is_inline() {
            if persistence.has_open_state(&session_id) {
                state.open = persistence.get_open_state(&session_id);
                if state.open && config.theme.auto_focus_input {
                    effects.push(Effect::ScheduleFocus(FOCUS_DELAY));
                }
            } else if config.theme.auto_open_bot {
                effects.push(Effect::ScheduleAutoOpen(open_delay(config.theme.open_delay)));
            }
        }

        info!(
            chatbot_id = %config.chatbot_id,
            session_id = %session_id,
            open = state.open,
            messages = state.messages.len(),
            "widget initialised"
        );

        let controller = Self {
            config,
            persistence,
            session_id,
            state,
            gesture: Gesture::Idle,
            next_request_id: 0,
            outstanding: None,
        };
        (controller, effects)
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Id of the request whose reply will be applied, if any.
    pub fn outstanding(&self) -> Option<u64> {
        self.outstanding
    }

    pub fn view(&self) -> View {
        render(&self.config, &self.state)
    }

    /// Drops the outstanding request so its reply is ignored.
    pub fn invalidate(&mut self) {
        if let Some(request_id) = self.outstanding.take() {
            debug!(request_id, "outstanding request invalidated");
        }
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            Event::BubbleClicked | Event::Toggle => {
                if self.state.open {
                    self.close();
                } else {
                    self.open(&mut effects);
                }
            }
            Event::CloseClicked => self.close(),
            Event::BubbleHovered => {
                if !self.config.is_inline() && self.config.theme.show_tooltip && !self.state.open
                {
                    self.state.tooltip_visible = true;
                }
            }
            Event::BubbleLeft => self.state.tooltip_visible = false,
            Event::InputChanged(text) => {
                self.state.input = text;
                self.check_limit();
            }
            Event::KeyPressed { key, shift } => {
                if key == "Enter" {
                    if shift {
                        self.state.input.push('\n');
                        self.check_limit();
                    } else {
                        self.send_input(&mut effects);
                    }
                }
            }
            Event::SendClicked => self.send_input(&mut effects),
            Event::Send(text) => self.send_text(&text, &mut effects),
            Event::StarterPromptClicked(index) => {
                if !self.state.shows_starter_prompts() {
                    debug!(index, "starter prompt ignored after the first exchange");
                } else if let Some(prompt) = self.config.theme.starter_prompts.get(index).cloned()
                {
                    self.send_text(&prompt, &mut effects);
                }
            }
            Event::CopyClicked(index) => match self.state.messages.get(index) {
                Some(message) if message.is_bot() && !message.thinking => {
                    effects.push(Effect::CopyToClipboard(message.content.clone()));
                }
                _ => debug!(index, "copy ignored; no bot message at index"),
            },
            Event::ClearChat => self.clear_chat(),
            Event::PointerDown {
                target,
                pointer,
                root_origin,
            } => self.press(target, pointer, root_origin),
            Event::PointerMoved(pointer) => self.pointer_moved(pointer),
            Event::PointerReleased => self.gesture = Gesture::Idle,
            Event::AutoOpenElapsed => {
                if self.persistence.has_open_state(&self.session_id) {
                    debug!("auto-open skipped; open state already persisted");
                } else if !self.state.open {
                    self.open(&mut effects);
                }
            }
            Event::AutoFocusElapsed => {
                if self.state.open {
                    self.state.input_focused = true;
                }
            }
            Event::Resumed => self.resume(&mut effects),
            Event::ReplyReceived {
                request_id,
                outcome,
            } => self.apply_reply(request_id, outcome),
        }
        effects
    }

    fn open(&mut self, effects: &mut Vec<Effect>) {
        if self.config.is_inline() {
            return;
        }
        self.state.open = true;
        self.state.tooltip_visible = false;
        self.persistence.set_open_state(&self.session_id, true);
        if self.config.theme.auto_focus_input {
            effects.push(Effect::ScheduleFocus(FOCUS_DELAY));
        }
        debug!(session_id = %self.session_id, "window opened");
    }

    fn close(&mut self) {
        if self.config.is_inline() {
            return;
        }
        self.state.open = false;
        self.state.input_focused = false;
        self.gesture = Gesture::Idle;
        self.persistence.set_open_state(&self.session_id, false);
        debug!(session_id = %self.session_id, "window closed");
    }

    fn check_limit(&mut self) {
        self.state.over_limit = self.state.char_count() > self.config.theme.max_characters;
    }

    fn send_input(&mut self, effects: &mut Vec<Effect>) {
        self.check_limit();
        if self.state.over_limit {
            debug!(
                length = self.state.char_count(),
                max = self.config.theme.max_characters,
                "send blocked by character limit"
            );
            return;
        }
        let text = self.state.input.trim().to_string();
        if text.is_empty() {
            return;
        }
        if self.deliver(text, effects) {
            self.state.input.clear();
        }
    }

    fn send_text(&mut self, text: &str, effects: &mut Vec<Effect>) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if text.chars().count() > self.config.theme.max_characters {
            warn!(
                max = self.config.theme.max_characters,
                "message longer than the character limit not sent"
            );
            return;
        }
        self.deliver(text.to_string(), effects);
    }

    /// Appends the user message and a thinking placeholder, then hands the request off.
    /// Returns false when no endpoint is configured.
    fn deliver(&mut self, text: String, effects: &mut Vec<Effect>) -> bool {
        let Some(endpoint) = self.config.endpoint() else {
            warn!(
                chatbot_id = %self.config.chatbot_id,
                routing_url = %self.config.routing_url,
                "cannot send without chatbotId and routingUrl"
            );
            return false;
        };

        if let Some(previous) = self.outstanding {
            debug!(request_id = previous, "request superseded by a newer send");
        }
        strip_thinking(&mut self.state.messages);
        let payload = build_payload(&text, &self.session_id, &self.config.metadata);
        self.state.messages.push(Message::user(text));
        self.state.messages.push(Message::thinking());
        self.persist_messages();

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.outstanding = Some(request_id);
        effects.push(Effect::Deliver(Delivery {
            request_id,
            endpoint,
            payload,
        }));
        true
    }

    fn apply_reply(&mut self, request_id: u64, outcome: Result<WebhookReply, WebhookError>) {
        if self.outstanding != Some(request_id) {
            debug!(request_id, "discarding reply for a superseded request");
            return;
        }
        self.outstanding = None;
        strip_thinking(&mut self.state.messages);
        let text = match outcome {
            Ok(reply) => reply.text().to_string(),
            Err(err) => {
                warn!(request_id, error = %err, "webhook delivery failed");
                self.config.theme.custom_error_message.clone()
            }
        };
        self.state.messages.push(Message::bot(text));
        self.persist_messages();
    }

    fn clear_chat(&mut self) {
        self.invalidate();
        self.state.messages = vec![welcome(&self.config)];
        self.persist_messages();
        info!(session_id = %self.session_id, "chat cleared");
    }

    fn press(&mut self, target: PressTarget, pointer: Point, root_origin: Point) {
        if self.config.is_inline() || !self.state.open {
            return;
        }
        self.gesture = match target {
            PressTarget::Header if self.config.theme.enable_drag => {
                Gesture::Dragging(DragSession::start(pointer, root_origin))
            }
            PressTarget::ResizeHandle if self.config.theme.enable_resize => {
                Gesture::Resizing(ResizeSession::start(pointer, &self.state.frame))
            }
            _ => Gesture::Idle,
        };
    }

    fn pointer_moved(&mut self, pointer: Point) {
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Dragging(drag) => self.state.frame.position = drag.position(pointer),
            Gesture::Resizing(resize) => {
                let limits = SizeLimits::from_theme(&self.config.theme);
                let (width, height) = resize.size(pointer, &limits);
                self.state.frame.width = width;
                self.state.frame.height = height;
            }
        }
    }

    fn resume(&mut self, effects: &mut Vec<Effect>) {
        self.invalidate();
        let mut restored = self.persistence.load_messages(&self.session_id);
        strip_thinking(&mut restored);
        self.state.messages = if restored.is_empty() {
            vec![welcome(&self.config)]
        } else {
            restored
        };

        if self.config.is_inline() {
            return;
        }
        let persisted = self.persistence.get_open_state(&self.session_id);
        if persisted != self.state.open {
            debug!(persisted, "re-syncing open state after resume");
            self.state.open = persisted;
            if persisted {
                self.state.tooltip_visible = false;
                if self.config.theme.auto_focus_input {
                    effects.push(Effect::ScheduleFocus(FOCUS_DELAY));
                }
            } else {
                self.state.input_focused = false;
                self.gesture = Gesture::Idle;
            }
        }
    }

    fn persist_messages(&self) {
        self.persistence
            .save_messages(&self.session_id, &self.state.messages);
    }
}

fn open_delay(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Mode, Theme, WidgetOptions, normalize},
        geometry::Position,
        message::thinking_count,
        storage::{KeyValueStore, MemoryStore, messages_key, open_key},
    };
    use serde_json::json;

    fn config(mode: Mode, theme: Value) -> Arc<Config> {
        Arc::new(normalize(
            &Theme::default(),
            WidgetOptions {
                chatbot_id: "bot-1".into(),
                routing_url: "https://route.example/chat/".into(),
                mode,
                theme: theme.as_object().cloned().unwrap_or_default(),
                ..WidgetOptions::default()
            },
        ))
    }

    fn controller(theme: Value) -> (Arc<MemoryStore>, Controller, Vec<Effect>) {
        let store = Arc::new(MemoryStore::new());
        let (controller, effects) =
            Controller::new(config(Mode::Bubble, theme), Persistence::new(store.clone()));
        (store, controller, effects)
    }

    fn delivery(effects: &[Effect]) -> &Delivery {
        effects
            .iter()
            .find_map(|effect| match effect {
                Effect::Deliver(delivery) => Some(delivery),
                _ => None,
            })
            .expect("delivery effect")
    }

    #[test]
    fn toggle_persists_open_flag() {
        let (store, mut controller, effects) = controller(json!({}));
        assert!(effects.is_empty());
        assert!(!controller.state().open);
        controller.handle(Event::BubbleClicked);
        assert!(controller.state().open);
        let key = open_key(controller.session_id());
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("true"));
        controller.handle(Event::CloseClicked);
        assert!(!controller.state().open);
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("false"));
    }

    #[test]
    fn opening_schedules_focus_when_configured() {
        let (_, mut controller, _) = controller(json!({ "autoFocusInput": true }));
        let effects = controller.handle(Event::Toggle);
        assert_eq!(effects, vec![Effect::ScheduleFocus(FOCUS_DELAY)]);
        controller.handle(Event::AutoFocusElapsed);
        assert!(controller.state().input_focused);
        controller.handle(Event::Toggle);
        assert!(!controller.state().input_focused);
    }

    #[test]
    fn auto_open_is_scheduled_on_fresh_load_only() {
        let (store, mut controller, effects) =
            controller(json!({ "autoOpenBot": true, "openDelay": 2 }));
        assert_eq!(effects, vec![Effect::ScheduleAutoOpen(Duration::from_secs(2))]);
        controller.handle(Event::AutoOpenElapsed);
        assert!(controller.state().open);

        let (_, effects) = Controller::new(
            config(Mode::Bubble, json!({ "autoOpenBot": true, "openDelay": 2 })),
            Persistence::new(store),
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn persisted_close_beats_pending_auto_open() {
        let (_, mut controller, _) = controller(json!({ "autoOpenBot": true }));
        controller.handle(Event::Toggle);
        controller.handle(Event::Toggle);
        controller.handle(Event::AutoOpenElapsed);
        assert!(!controller.state().open);
    }

    #[test]
    fn tooltip_shows_on_hover_while_closed() {
        let (_, mut controller, _) = controller(json!({}));
        controller.handle(Event::BubbleHovered);
        assert!(controller.state().tooltip_visible);
        controller.handle(Event::Toggle);
        assert!(!controller.state().tooltip_visible);
        controller.handle(Event::BubbleHovered);
        assert!(!controller.state().tooltip_visible);
        controller.handle(Event::Toggle);
        controller.handle(Event::BubbleHovered);
        controller.handle(Event::BubbleLeft);
        assert!(!controller.state().tooltip_visible);
    }

    #[test]
    fn send_appends_user_and_single_placeholder() {
        let (store, mut controller, _) = controller(json!({}));
        controller.handle(Event::InputChanged("  Hello  ".into()));
        let effects = controller.handle(Event::KeyPressed {
            key: "Enter".into(),
            shift: false,
        });
        let delivery = delivery(&effects);
        assert_eq!(delivery.endpoint, "https://route.example/chat/bot-1");
        assert_eq!(delivery.payload["chatInput"], "Hello");
        assert_eq!(delivery.payload["sessionId"], controller.session_id());
        assert_eq!(controller.state().input, "");
        let messages = &controller.state().messages;
        assert_eq!(messages[1], Message::user("Hello"));
        assert!(messages[2].thinking);

        let stored = store
            .get(&messages_key(controller.session_id()))
            .unwrap()
            .unwrap();
        assert!(stored.contains("Hello"));
    }

    #[test]
    fn shift_enter_inserts_newline() {
        let (_, mut controller, _) = controller(json!({}));
        controller.handle(Event::InputChanged("line".into()));
        let effects = controller.handle(Event::KeyPressed {
            key: "Enter".into(),
            shift: true,
        });
        assert!(effects.is_empty());
        assert_eq!(controller.state().input, "line\n");
    }

    #[test]
    fn whitespace_only_input_is_not_sent() {
        let (_, mut controller, _) = controller(json!({}));
        controller.handle(Event::InputChanged(" \n\t ".into()));
        assert!(controller.handle(Event::SendClicked).is_empty());
        assert_eq!(controller.state().messages.len(), 1);
    }

    #[test]
    fn character_limit_is_inclusive() {
        let (_, mut controller, _) = controller(json!({ "maxCharacters": 5 }));
        controller.handle(Event::InputChanged("abcdef".into()));
        assert!(controller.state().over_limit);
        assert!(controller.handle(Event::SendClicked).is_empty());
        assert_eq!(controller.state().input, "abcdef");

        controller.handle(Event::InputChanged("abcde".into()));
        assert!(!controller.state().over_limit);
        assert_eq!(controller.handle(Event::SendClicked).len(), 1);
    }

    #[test]
    fn reply_replaces_placeholder() {
        let (_, mut controller, _) = controller(json!({}));
        let effects = controller.handle(Event::Send("Hello".into()));
        let request_id = delivery(&effects).request_id;
        controller.handle(Event::ReplyReceived {
            request_id,
            outcome: Ok(WebhookReply::new("Hi!")),
        });
        let messages = &controller.state().messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2], Message::bot("Hi!"));
        assert_eq!(controller.outstanding(), None);
    }

    #[test]
    fn failure_appends_custom_error() {
        let (_, mut controller, _) = controller(json!({ "customErrorMessage": "Oops" }));
        let effects = controller.handle(Event::Send("Hello".into()));
        controller.handle(Event::ReplyReceived {
            request_id: delivery(&effects).request_id,
            outcome: Err(WebhookError::Status {
                status: 500,
                body: String::new(),
            }),
        });
        assert_eq!(controller.state().messages[2], Message::bot("Oops"));
        assert_eq!(thinking_count(&controller.state().messages), 0);
    }

    #[test]
    fn superseded_reply_is_discarded() {
        let (_, mut controller, _) = controller(json!({}));
        let first = delivery(&controller.handle(Event::Send("one".into()))).request_id;
        let second = delivery(&controller.handle(Event::Send("two".into()))).request_id;
        assert_eq!(thinking_count(&controller.state().messages), 1);

        controller.handle(Event::ReplyReceived {
            request_id: first,
            outcome: Ok(WebhookReply::new("late")),
        });
        assert_eq!(thinking_count(&controller.state().messages), 1);
        controller.handle(Event::ReplyReceived {
            request_id: second,
            outcome: Ok(WebhookReply::new("fresh")),
        });
        let contents: Vec<&str> = controller
            .state()
            .messages
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec!["Hello! How can I help you today?", "one", "two", "fresh"]
        );
    }

    #[test]
    fn clear_chat_resets_and_invalidates() {
        let (_, mut controller, _) = controller(json!({}));
        controller.handle(Event::Toggle);
        let request_id = delivery(&controller.handle(Event::Send("Hello".into()))).request_id;
        controller.handle(Event::ClearChat);
        assert_eq!(controller.state().messages.len(), 1);
        assert!(controller.state().open);
        controller.handle(Event::ReplyReceived {
            request_id,
            outcome: Ok(WebhookReply::new("late")),
        });
        assert_eq!(controller.state().messages.len(), 1);
    }

    #[test]
    fn copy_emits_bot_message_text() {
        let (_, mut controller, _) = controller(json!({ "showCopyToClipboard": true }));
        let request_id = delivery(&controller.handle(Event::Send("Hello".into()))).request_id;
        assert!(controller.handle(Event::CopyClicked(2)).is_empty());

        controller.handle(Event::ReplyReceived {
            request_id,
            outcome: Ok(WebhookReply::new("Hi!")),
        });
        assert_eq!(
            controller.handle(Event::CopyClicked(2)),
            vec![Effect::CopyToClipboard("Hi!".into())]
        );
        assert!(controller.handle(Event::CopyClicked(1)).is_empty());
        assert!(controller.handle(Event::CopyClicked(9)).is_empty());
    }

    #[test]
    fn missing_endpoint_keeps_input() {
        let store = Arc::new(MemoryStore::new());
        let config = Arc::new(normalize(&Theme::default(), WidgetOptions::default()));
        let (mut controller, _) = Controller::new(config, Persistence::new(store));
        controller.handle(Event::InputChanged("Hello".into()));
        assert!(controller.handle(Event::SendClicked).is_empty());
        assert_eq!(controller.state().input, "Hello");
        assert_eq!(controller.state().messages.len(), 1);
    }

    #[test]
    fn starter_prompt_sends_only_before_first_exchange() {
        let (_, mut controller, _) = controller(json!({ "starterPrompts": ["Pricing?"] }));
        let effects = controller.handle(Event::StarterPromptClicked(0));
        assert_eq!(delivery(&effects).payload["chatInput"], "Pricing?");
        assert!(controller.handle(Event::StarterPromptClicked(0)).is_empty());
    }

    #[test]
    fn drag_moves_root_and_ignores_buttons() {
        let (_, mut controller, _) = controller(json!({}));
        controller.handle(Event::Toggle);
        controller.handle(Event::PointerDown {
            target: PressTarget::Button,
            pointer: Point::new(10.0, 10.0),
            root_origin: Point::new(100.0, 100.0),
        });
        controller.handle(Event::PointerMoved(Point::new(50.0, 50.0)));
        assert_eq!(controller.state().frame.position, Position::Anchored);

        controller.handle(Event::PointerDown {
            target: PressTarget::Header,
            pointer: Point::new(10.0, 10.0),
            root_origin: Point::new(100.0, 100.0),
        });
        controller.handle(Event::PointerMoved(Point::new(30.0, 5.0)));
        controller.handle(Event::PointerReleased);
        controller.handle(Event::PointerMoved(Point::new(500.0, 500.0)));
        assert_eq!(
            controller.state().frame.position,
            Position::Absolute {
                left: 120.0,
                top: 95.0
            }
        );
    }

    #[test]
    fn resize_clamps_to_floor() {
        let (_, mut controller, _) = controller(json!({ "maxWindowWidth": 500 }));
        controller.handle(Event::Toggle);
        controller.handle(Event::PointerDown {
            target: PressTarget::ResizeHandle,
            pointer: Point::new(0.0, 0.0),
            root_origin: Point::default(),
        });
        controller.handle(Event::PointerMoved(Point::new(-300.0, 400.0)));
        assert_eq!(controller.state().frame.width, 500.0);
        assert_eq!(controller.state().frame.height, 300.0);
    }

    #[test]
    fn inline_mode_ignores_toggle_and_gestures() {
        let store = Arc::new(MemoryStore::new());
        let (mut controller, effects) = Controller::new(
            config(Mode::Inpage, json!({ "autoOpenBot": true })),
            Persistence::new(store),
        );
        assert!(effects.is_empty());
        assert!(controller.state().open);
        controller.handle(Event::Toggle);
        assert!(controller.state().open);
        controller.handle(Event::PointerDown {
            target: PressTarget::Header,
            pointer: Point::default(),
            root_origin: Point::default(),
        });
        controller.handle(Event::PointerMoved(Point::new(40.0, 40.0)));
        assert_eq!(controller.state().frame.position, Position::Anchored);
    }

    #[test]
    fn restore_strips_stale_placeholders() {
        let (store, mut controller, _) = controller(json!({}));
        controller.handle(Event::Toggle);
        controller.handle(Event::Send("Hello".into()));
        let (reloaded, _) = Controller::new(
            config(Mode::Bubble, json!({})),
            Persistence::new(store),
        );
        assert!(reloaded.state().open);
        assert_eq!(reloaded.state().messages.len(), 2);
        assert_eq!(thinking_count(&reloaded.state().messages), 0);
    }

    #[test]
    fn clear_chat_on_reload_discards_history() {
        let (store, mut controller, _) = controller(json!({}));
        controller.handle(Event::Send("Hello".into()));
        let (reloaded, _) = Controller::new(
            config(Mode::Bubble, json!({ "clearChatOnReload": true })),
            Persistence::new(store),
        );
        assert_eq!(reloaded.state().messages.len(), 1);
    }

    #[test]
    fn clear_chat_on_reload_forgets_open_window() {
        let (store, mut controller, _) = controller(json!({}));
        controller.handle(Event::Toggle);
        controller.handle(Event::Send("Hello".into()));
        let session_id = controller.session_id().to_string();

        let (reloaded, _) = Controller::new(
            config(Mode::Bubble, json!({ "clearChatOnReload": true })),
            Persistence::new(store.clone()),
        );
        assert!(!reloaded.state().open);
        assert_eq!(store.get(&open_key(&session_id)).unwrap(), None);
        assert_eq!(store.get(&messages_key(&session_id)).unwrap(), None);
    }

    #[test]
    fn resume_resyncs_from_storage() {
        let (store, mut controller, _) = controller(json!({}));
        let session_id = controller.session_id().to_string();
        let persistence = Persistence::new(store);
        persistence.save_messages(
            &session_id,
            &[Message::bot("welcome"), Message::user("from another tab")],
        );
        persistence.set_open_state(&session_id, true);

        controller.handle(Event::Resumed);
        assert!(controller.state().open);
        assert_eq!(controller.state().messages[1], Message::user("from another tab"));
    }

    #[test]
    fn open_delay_handles_odd_values() {
        assert_eq!(open_delay(0.0), Duration::ZERO);
        assert_eq!(open_delay(-3.0), Duration::ZERO);
        assert_eq!(open_delay(1.5), Duration::from_millis(1500));
    }
}
