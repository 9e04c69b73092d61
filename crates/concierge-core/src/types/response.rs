//! Successful response envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body; `null` when the server sent none.
    pub data: Value,
}

impl ApiResponse {
    /// Create a response.
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    /// Deserialize the body into a typed value.
    ///
    /// A body that does not match `T` becomes an [`ApiError`] with
    /// [`ErrorStatus::Parsing`](crate::ErrorStatus::Parsing).
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.data.clone()).map_err(|e| ApiError::parsing(e.to_string()))
    }
}
