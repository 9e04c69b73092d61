//! Error types for concierge.
//!
//! [`ApiError`] is the error half of the response envelope every request
//! resolves to. [`Error`] is the wider crate error used where something other
//! than an API call can fail (input validation, local storage).

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// The unified error type for concierge operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An API call failed (transport, HTTP status, or refresh failure).
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Input validation errors (invalid URL, header, or request body).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The HTTP client could not be constructed.
    #[error("client setup failed: {message}")]
    ClientSetup { message: String },

    /// Local session storage failed.
    #[error("storage error: {message}")]
    Storage { message: String },
}

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// The server answered with a non-2xx status code.
    Http(u16),
    /// The request never produced a response (DNS, TLS, connection reset).
    Fetch,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// A response arrived but its body could not be used.
    Parsing,
}

impl ErrorStatus {
    /// Returns the HTTP status code, if the server answered.
    pub fn code(&self) -> Option<u16> {
        match self {
            ErrorStatus::Http(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorStatus::Http(code) => write!(f, "HTTP {}", code),
            ErrorStatus::Fetch => f.write_str("FETCH_ERROR"),
            ErrorStatus::Timeout => f.write_str("TIMEOUT_ERROR"),
            ErrorStatus::Parsing => f.write_str("PARSING_ERROR"),
        }
    }
}

/// A failed API call, returned as a value rather than raised.
///
/// `data` carries whatever the server sent back (JSON when it parsed, a string
/// otherwise, `null` when empty). `message` is a user-facing annotation added
/// by the client, such as the session-expired notice.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// What kind of failure this is.
    pub status: ErrorStatus,
    /// Response body or failure detail.
    pub data: Value,
    /// User-facing message, if one was attached.
    pub message: Option<String>,
}

impl ApiError {
    /// Create an error for a non-2xx HTTP response.
    pub fn http(status: u16, data: Value) -> Self {
        Self {
            status: ErrorStatus::Http(status),
            data,
            message: None,
        }
    }

    /// Create an error for a request that never reached the server.
    pub fn fetch(detail: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::Fetch,
            data: Value::String(detail.into()),
            message: None,
        }
    }

    /// Create an error for a request that timed out.
    pub fn timeout(detail: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::Timeout,
            data: Value::String(detail.into()),
            message: None,
        }
    }

    /// Create an error for a response whose body could not be used.
    pub fn parsing(detail: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::Parsing,
            data: Value::String(detail.into()),
            message: None,
        }
    }

    /// Attach a user-facing message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns true if the server rejected the credentials (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        self.status == ErrorStatus::Http(401)
    }

    /// Returns true if the server refused the session outright (HTTP 403).
    pub fn is_forbidden(&self) -> bool {
        self.status == ErrorStatus::Http(403)
    }

    /// The server's own error message, when the body is `{"message": "..."}`.
    pub fn server_message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        } else if let Some(message) = self.server_message() {
            write!(f, ": {}", message)?;
        } else if let Value::String(detail) = &self.data {
            if !detail.is_empty() {
                write!(f, ": {}", detail)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Invalid HTTP method name.
    #[error("invalid HTTP method '{value}'")]
    Method { value: String },

    /// Invalid header name or value.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Request body that is not valid JSON.
    #[error("invalid request body: {reason}")]
    Body { reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
