//! Error types for the Observer API server.
//!
//! [`ObserverError`] converts into an HTTP response with a JSON body of
//! the form `{"error": "...", "status": 400}`.

use architect_oracle::OracleError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// An invalid query parameter or body was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A component the endpoint needs is not attached.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The oracle call behind the pass-through failed.
    #[error("{0}")]
    Oracle(#[from] OracleError),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Oracle(_) | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
