//! Error types and HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// All failure classes the service distinguishes.
///
/// Ingestion-side failures (extraction, chunk persistence) are normally
/// absorbed into the document's status instead of surfacing here; the
/// variants below are the synchronous HTTP-level failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid caller token
    #[error("{0}")]
    Authentication(String),

    /// Malformed or oversized request payload
    #[error("{0}")]
    Validation(String),

    /// Document id unknown or not owned by the caller
    #[error("{0}")]
    NotFound(String),

    /// Completion gateway reported rate limiting (upstream 429)
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    /// Completion gateway reported exhausted credits (upstream 402)
    #[error("AI credits exhausted. Please add credits to continue.")]
    QuotaExhausted,

    /// Completion gateway failed in any other way
    #[error("AI service error: {0}")]
    Gateway(String),

    /// Object storage failure
    #[error("storage error: {0}")]
    ObjectStore(String),

    /// Relational store failure
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration problem
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// HTTP status this error maps to at the handler boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::QuotaExhausted => StatusCode::PAYMENT_REQUIRED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Gateway(_)
            | Self::ObjectStore(_)
            | Self::Database(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
