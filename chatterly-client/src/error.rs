//! Client error type.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias used across the client library.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures surfaced by the client library.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-2xx status.
    #[error("{status}: {message}")]
    Api {
        /// HTTP status returned.
        status: StatusCode,
        /// Backend message, or a generic fallback.
        message: String,
    },

    /// The request never produced a response (DNS, TLS, refused, timeout).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A 2xx body or a channel frame did not match the expected shape.
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local session storage could not be read or written.
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// The live channel handshake or socket failed.
    #[error("live channel error: {0}")]
    Channel(#[from] tokio_tungstenite::tungstenite::Error),

    /// An intent was emitted while the live channel is not connected.
    #[error("live channel is not connected")]
    NotConnected,

    /// The operation needs an authenticated session.
    #[error("not logged in")]
    NotAuthenticated,

    /// The operation references a room that is not loaded.
    #[error("unknown room {0}")]
    UnknownRoom(String),

    /// A configured endpoint could not be joined into a request URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Build an [`ClientError::Api`].
    #[must_use]
    pub fn api(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Bad credentials or an expired token.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Api { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        ) || matches!(self, Self::NotAuthenticated)
    }

    /// Server-supplied message for API errors, display text otherwise.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status_and_message() {
        let err = ClientError::api(StatusCode::UNAUTHORIZED, "Invalid email or password");
        assert_eq!(
            err.to_string(),
            "401 Unauthorized: Invalid email or password"
        );
        assert_eq!(err.user_message(), "Invalid email or password");
    }

    #[test]
    fn classifies_auth_failures() {
        assert!(ClientError::api(StatusCode::UNAUTHORIZED, "x").is_auth());
        assert!(ClientError::api(StatusCode::FORBIDDEN, "x").is_auth());
        assert!(ClientError::NotAuthenticated.is_auth());
        assert!(!ClientError::api(StatusCode::INTERNAL_SERVER_ERROR, "x").is_auth());
        assert!(!ClientError::NotConnected.is_auth());
    }
}
