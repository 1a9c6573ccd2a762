//! Error types for the reqwest-based client.

use flowdesk_core::ErrorKind;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for reqwest operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, possibly empty.
        body: String,
    },
    /// The base URL cannot have path segments appended.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Maps an HTTP status onto the core error kind.
pub(crate) fn kind_for_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
        StatusCode::FORBIDDEN => ErrorKind::Authorization,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
        StatusCode::CONFLICT => ErrorKind::Conflict,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        StatusCode::SERVICE_UNAVAILABLE => ErrorKind::ServiceUnavailable,
        s if s.is_client_error() => ErrorKind::InvalidInput,
        s if s.is_server_error() => ErrorKind::ExternalError,
        _ => ErrorKind::Unknown,
    }
}

impl From<Error> for flowdesk_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    Self::timeout().with_message(e.to_string()).with_source(e)
                } else if e.is_connect() {
                    Self::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_decode() {
                    Self::serialization()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    Self::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => Self::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::Status { status, body } => {
                let message = if body.is_empty() {
                    status.to_string()
                } else {
                    format!("{status}: {body}")
                };
                Self::new(kind_for_status(status)).with_message(message)
            }
            Error::InvalidBaseUrl(url) => Self::configuration()
                .with_message(format!("base URL `{url}` cannot be a base")),
        }
    }
}
