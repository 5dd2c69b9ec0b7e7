//! Error types for the config server HTTP boundary.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use config::ConfigFileError;
use errors::{ProviderError, SetupError};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for the server.
pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Failure reported by the active provider.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Missing or invalid request parameter.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Provider could not be built at start.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Configuration(#[from] ConfigFileError),

    /// Server startup error.
    #[error("Server error: {0}")]
    Server(String),
}

/// Error response body for HTTP endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ServerError {
    /// HTTP status and stable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Provider(e) => match e {
                ProviderError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                ProviderError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                ProviderError::BackendUnavailable { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, "BACKEND_UNAVAILABLE")
                }
                ProviderError::UpstreamError { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
                ProviderError::ParseError { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "PARSE_ERROR")
                }
            },
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Setup(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SETUP_ERROR"),
            Self::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
            Self::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, details) = match &self {
            Self::Provider(ProviderError::Unauthorized { reason }) => {
                ("Authorization failed".to_string(), Some(reason.clone()))
            }
            Self::Provider(ProviderError::UpstreamError { status, message }) => (
                format!("Backend answered with status {}", status),
                Some(message.clone()),
            ),
            Self::Provider(e @ ProviderError::BackendUnavailable { .. }) => {
                tracing::warn!(error = %e, "Backend unavailable");
                ("Configuration backend unavailable".to_string(), Some(e.to_string()))
            }
            Self::Provider(e @ ProviderError::ParseError { .. }) => {
                tracing::error!(error = %e, "Malformed backend payload");
                ("Failed to parse configuration".to_string(), Some(e.to_string()))
            }
            Self::Provider(e) => (e.to_string(), None),
            Self::BadRequest(msg) => ("Invalid request".to_string(), Some(msg.clone())),
            other => {
                tracing::error!(error = %other, "Internal error");
                ("An internal error occurred".to_string(), Some(other.to_string()))
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
