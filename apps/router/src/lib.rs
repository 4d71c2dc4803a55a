//! Stateless routing backend for the chat widget.
//!
//! ```text
//! POST /chat/{chatbot_id}   { "chatInput": "...", "sessionId": "...", ...metadata }
//! ```
//! resolves the chatbot's webhook, forwards the enriched payload and relays the reply.

pub mod config;
pub mod directory;
pub mod error;
pub mod forward;
pub mod reqid;

use std::time::Duration;

use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderName, Method, StatusCode, header},
    middleware,
    routing::{get, post},
};
use chatwidget_telemetry::{RouteLabels, record_counter, with_route_fields};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tower_http::cors::{Any, CorsLayer};
use tracing::{Instrument, field, info, info_span, warn};

pub use config::RouterConfig;
pub use directory::{ChatbotDirectory, ChatbotRecord, MemoryDirectory, SharedDirectory};
pub use error::RouteError;
pub use forward::HttpForwarder;
pub use reqid::{RequestId, with_request_id};

pub const REQUESTS_TOTAL: &str = "chat_route_requests_total";

#[derive(Clone)]
pub struct AppState {
    pub directory: SharedDirectory,
    pub forwarder: HttpForwarder,
}

impl AppState {
    pub fn new(directory: SharedDirectory, webhook_timeout: Duration) -> Self {
        Self {
            directory,
            forwarder: HttpForwarder::new(reqwest::Client::new(), webhook_timeout),
        }
    }

    pub fn with_forwarder(mut self, forwarder: HttpForwarder) -> Self {
        self.forwarder = forwarder;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/chat", post(missing_chatbot_id))
        .route("/chat/", post(missing_chatbot_id))
        .route("/chat/{chatbot_id}", post(route_chat))
        .with_state(state)
        .layer(cors_layer())
        .layer(middleware::from_fn(with_request_id))
}

/// Any origin, and the headers browser SDKs attach to function calls.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn missing_chatbot_id() -> RouteError {
    record_counter(REQUESTS_TOTAL, 1, &RouteLabels::new());
    RouteError::MissingChatbotId
}

async fn route_chat(
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
    request_id: Option<Extension<RequestId>>,
    body: Bytes,
) -> Result<Json<Value>, RouteError> {
    let span = info_span!(
        "route_chat",
        chatbot_id = field::Empty,
        request_id = field::Empty
    );
    with_route_fields(
        &span,
        &chatbot_id,
        request_id.as_ref().map(|Extension(id)| id.as_str()),
    );
    record_counter(REQUESTS_TOTAL, 1, &RouteLabels::new().chatbot(&chatbot_id));
    forward_chat(state, chatbot_id, body).instrument(span).await
}

async fn forward_chat(
    state: AppState,
    chatbot_id: String,
    body: Bytes,
) -> Result<Json<Value>, RouteError> {
    let chatbot_id = chatbot_id.trim();
    if chatbot_id.is_empty() || chatbot_id == "chat" {
        return Err(RouteError::MissingChatbotId);
    }

    let Some(record) = state.directory.lookup(chatbot_id).await? else {
        warn!("chatbot not found");
        return Err(RouteError::NotFound);
    };
    let Some(webhook_url) = record.webhook().map(str::to_string) else {
        warn!("no webhook url configured for chatbot");
        return Err(RouteError::NotConfigured);
    };

    let payload = parse_body(&body)?;
    let payload = forward::enrich(payload, &record, OffsetDateTime::now_utc())?;

    info!(webhook_url = %webhook_url, "routing message");
    let reply = state.forwarder.forward(&webhook_url, &payload).await?;
    info!("message routed");
    Ok(Json(reply))
}

fn parse_body(body: &[u8]) -> Result<Map<String, Value>, RouteError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RouteError::Internal(
            "request body must be a JSON object".into(),
        )),
        Err(err) => Err(RouteError::Internal(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_must_be_an_object() {
        assert!(parse_body(br#"{"chatInput":"hi"}"#).is_ok());
        assert!(matches!(parse_body(b"[1]"), Err(RouteError::Internal(_))));
        assert!(matches!(parse_body(b""), Err(RouteError::Internal(_))));
    }
}
