//! Embeddable chat widget runtime.
//!
//! A page creates one [`ChatWidget`] from a JSON options object. The widget normalizes its
//! configuration, restores the visitor's session from durable storage, renders a pure
//! [`View`] of its UI and relays visitor messages to a routing endpoint.
#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod embed;
pub mod geometry;
pub mod icons;
pub mod message;
pub mod render;
pub mod state;
pub mod storage;
pub mod style;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod webhook;
pub mod widget;

pub use config::{Config, Mode, MetadataValue, Theme, WidgetOptions, normalize};
pub use controller::{Controller, Delivery, Effect, Event, PressTarget};
pub use embed::{DEFAULT_SCRIPT_URL, embed_snippet};
pub use geometry::{Point, Position};
pub use message::{Message, Role};
pub use render::{Element, Mount, Node, View, render};
pub use state::WidgetState;
pub use storage::{
    FileStore, KeyValueStore, MemoryStore, Persistence, SharedStore, StorageError, memory_store,
};
pub use webhook::{
    HttpWebhookClient, SharedWebhookClient, WebhookClient, WebhookError, WebhookReply,
};
pub use widget::{ChatWidget, HostPage, InitError, StaticPage, WidgetEnv};

/// Returns the semantic version advertised by this crate.
///
/// ```
/// assert_eq!(chatwidget_core::version(), env!("CARGO_PKG_VERSION"));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
