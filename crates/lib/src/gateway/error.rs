//! Webhook failures and the HTTP status each one answers with.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Missing or mismatched `x-hub-signature-256`.
    #[error("webhook signature check failed")]
    AuthFailure,
    /// Wrong `hub.mode` or `hub.verify_token`.
    #[error("webhook handshake rejected")]
    HandshakeFailure,
    /// `object` is not "instagram".
    #[error("unexpected webhook object: {0:?}")]
    ShapeMismatch(Option<String>),
    #[error("webhook body is not valid JSON: {0}")]
    MalformedBody(String),
    #[error("webhook dispatch failed: {0}")]
    Unexpected(String),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::AuthFailure => StatusCode::UNAUTHORIZED,
            WebhookError::HandshakeFailure => StatusCode::FORBIDDEN,
            WebhookError::ShapeMismatch(_) => StatusCode::NOT_FOUND,
            WebhookError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            WebhookError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Bare status with its reason phrase; no detail leaks to the caller.
impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = status.canonical_reason().unwrap_or_default();
        (status, reason).into_response()
    }
}
