//! # Config Server Errors
//!
//! Error taxonomy shared by every configuration provider.
//!
//! Each backend signals failure differently (HTTP status codes, missing
//! documents, I/O errors). Providers translate those signals into
//! [`ProviderError`] so that callers see the same small set of kinds no
//! matter which backend is active.
//!
//! Setup-time failures (bad configuration, unreachable database at start)
//! are kept apart in [`SetupError`] so the request taxonomy stays closed.

use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;

/// Failure kinds a provider operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    BackendUnavailable,
    ParseError,
    UpstreamError,
}

/// Errors raised by provider operations (login, fetch, search).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// A single scope address resolved to nothing.
    ///
    /// Absorbed into an empty result by the two-scope resolution; callers of
    /// the fetch operations never see it.
    #[error("Not found: {location}")]
    NotFound { location: String },

    #[error("Backend {backend} unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    #[error("Failed to parse payload at {location}: {reason}")]
    ParseError { location: String, reason: String },

    #[error("Upstream returned {status}: {message}")]
    UpstreamError { status: u16, message: String },
}

impl ProviderError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    pub fn not_found(location: impl Into<String>) -> Self {
        Self::NotFound {
            location: location.into(),
        }
    }

    pub fn unavailable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::UpstreamError {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Self::ParseError { .. } => ErrorKind::ParseError,
            Self::UpstreamError { .. } => ErrorKind::UpstreamError,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Backend status code, when the failure came from an HTTP answer.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while building a provider from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Provider {provider} not enabled: {reason}")]
    NotEnabled { provider: String, reason: String },

    #[error("Connection to {backend} failed: {reason}")]
    Connection { backend: String, reason: String },
}

impl SetupError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            ProviderError::unauthorized("no header").kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(ProviderError::not_found("a/b").kind(), ErrorKind::NotFound);
        assert_eq!(
            ProviderError::unavailable("vault", "refused").kind(),
            ErrorKind::BackendUnavailable
        );
        assert_eq!(
            ProviderError::parse("values.yml", "bad indent").kind(),
            ErrorKind::ParseError
        );
        assert_eq!(
            ProviderError::upstream(403, "forbidden").kind(),
            ErrorKind::UpstreamError
        );
    }

    #[test]
    fn test_upstream_keeps_status_and_message() {
        let err = ProviderError::upstream(401, "Bad credentials");
        assert_eq!(err.upstream_status(), Some(401));
        assert_eq!(err.to_string(), "Upstream returned 401: Bad credentials");
        assert_eq!(ProviderError::not_found("x").upstream_status(), None);
    }

    #[test]
    fn test_only_not_found_is_absorbable() {
        assert!(ProviderError::not_found("configs/p/globals/v1/dev").is_not_found());
        assert!(!ProviderError::parse("x", "y").is_not_found());
    }

    #[test]
    fn test_error_kind_wire_names() {
        assert_eq!(ErrorKind::BackendUnavailable.to_string(), "backend_unavailable");
        assert_eq!(
            ErrorKind::from_str("parse_error").unwrap(),
            ErrorKind::ParseError
        );
        assert_eq!(
            serde_json::to_string(&ErrorKind::UpstreamError).unwrap(),
            "\"upstream_error\""
        );
    }

    #[test]
    fn test_setup_error_display() {
        let err = SetupError::configuration("provider.git.repo_owner is empty");
        assert!(err.to_string().contains("repo_owner"));
    }
}
