//! Backend error bodies.

use serde::{Deserialize, Serialize};

/// Fallback used when the backend error body carries no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// The main error message
    #[serde(default)]
    pub message: String,
}

impl ErrorResponse {
    /// Extract the message from a raw response body, falling back to
    /// [`GENERIC_ERROR_MESSAGE`] when the body is not a parseable error object
    /// or its message is blank.
    #[must_use]
    pub fn message_from_body(body: &[u8]) -> String {
        serde_json::from_slice::<Self>(body)
            .ok()
            .map(|error| error.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
    }
}
