use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chatwidget_telemetry::{RouteLabels, record_counter};
use serde::Serialize;

use crate::directory::DirectoryError;

pub const ERRORS_TOTAL: &str = "chat_route_errors_total";

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("chatbot id is required")]
    MissingChatbotId,
    #[error("chatbot not found")]
    NotFound,
    #[error("chatbot has no webhook configured")]
    NotConfigured,
    #[error("webhook returned HTTP {0}")]
    UpstreamStatus(u16),
    #[error("failed to reach webhook: {0}")]
    Unreachable(String),
    #[error("webhook timed out")]
    Timeout,
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::MissingChatbotId | RouteError::NotConfigured => StatusCode::BAD_REQUEST,
            RouteError::NotFound => StatusCode::NOT_FOUND,
            RouteError::UpstreamStatus(_) | RouteError::Unreachable(_) => StatusCode::BAD_GATEWAY,
            RouteError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            RouteError::Directory(_) | RouteError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Metric label for the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::MissingChatbotId => "missing_id",
            RouteError::NotFound => "not_found",
            RouteError::NotConfigured => "not_configured",
            RouteError::UpstreamStatus(_) => "upstream_status",
            RouteError::Unreachable(_) => "unreachable",
            RouteError::Timeout => "timeout",
            RouteError::Directory(_) => "directory",
            RouteError::Internal(_) => "internal",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            RouteError::MissingChatbotId => ("Chatbot ID is required", None),
            RouteError::NotFound => ("Chatbot not found", None),
            RouteError::NotConfigured => ("Chatbot not configured", None),
            RouteError::UpstreamStatus(status) => {
                ("Webhook service unavailable", Some(format!("HTTP {status}")))
            }
            RouteError::Unreachable(details) => {
                ("Failed to reach webhook service", Some(details.clone()))
            }
            RouteError::Timeout => ("Webhook timeout", None),
            RouteError::Directory(err) => ("Internal server error", Some(err.to_string())),
            RouteError::Internal(details) => ("Internal server error", Some(details.clone())),
        };
        ErrorBody {
            error: error.to_string(),
            details,
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        record_counter(ERRORS_TOTAL, 1, &RouteLabels::new().kind(self.kind()));
        (self.status(), Json(self.body())).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
