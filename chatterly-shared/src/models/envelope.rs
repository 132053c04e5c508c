//! Success envelope shared by every REST endpoint.

use serde::{Deserialize, Serialize};

/// Standard `{data, message}` body wrapping every successful REST response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponse<T> {
    /// Endpoint payload.
    pub data: T,
    /// Human-readable status line; often empty.
    #[serde(default)]
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Drop the envelope and keep the payload.
    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }
}
