//! Session endpoint defaults and payload types.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::tokens::{AccessToken, SessionCredentials};
use crate::types::ApiResponse;

/// Password login.
pub const LOGIN: &str = "/auth/login";

/// Token refresh, authenticated by the ambient session cookie.
pub const REFRESH: &str = "/auth/refresh";

/// Server-side session teardown.
pub const LOGOUT: &str = "/auth/logout";

/// Request body for login.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

/// Response from login and refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub access_token: String,
    /// Lifetime of the token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Extract session credentials from a login or refresh response.
    ///
    /// A 2xx without a usable token is a failure, not a session.
    pub(crate) fn credentials(response: &ApiResponse) -> Result<SessionCredentials, ApiError> {
        let payload: TokenResponse = response.json()?;

        if payload.access_token.is_empty() {
            return Err(ApiError::parsing("response carried an empty access token"));
        }

        let credentials = SessionCredentials::new(AccessToken::new(payload.access_token));
        Ok(match payload.expires_in {
            Some(seconds) => credentials.expiring_in(seconds),
            None => credentials,
        })
    }
}
