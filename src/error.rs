//! Error classification shared by every external call.

use axum::http::StatusCode;
use thiserror::Error;

/// Outcome of a failed operation, classified by who is at fault and
/// whether trying again can help.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    /// The caller supplied unusable input.
    #[error("{0}")]
    Validation(String),

    /// The lookup ran fine but matched nothing.
    #[error("{0}")]
    NotFound(String),

    /// An external service failed or answered with something unusable.
    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
        retryable: bool,
    },

    /// Missing or invalid credentials/settings. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ServiceError {
    pub fn upstream(service: &'static str, message: impl Into<String>, retryable: bool) -> Self {
        ServiceError::Upstream {
            service,
            message: message.into(),
            retryable,
        }
    }

    /// Classifies a transport-level reqwest failure. Timeouts and connection
    /// problems can go away on their own, decode failures can't.
    pub fn from_reqwest(service: &'static str, err: &reqwest::Error) -> Self {
        let retryable = err.is_timeout() || err.is_connect() || err.is_request();
        ServiceError::upstream(service, err.to_string(), retryable)
    }

    /// Classifies a non-2xx HTTP status returned by an external service.
    pub fn from_status(service: &'static str, status: reqwest::StatusCode, body: &str) -> Self {
        let retryable = status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS;
        ServiceError::upstream(
            service,
            format!("status {}: {}", status.as_u16(), body),
            retryable,
        )
    }

    /// Returns true if the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Upstream {
                retryable: true,
                ..
            }
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Upstream { .. } => "upstream",
            ServiceError::Configuration(_) => "configuration",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ServiceError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
