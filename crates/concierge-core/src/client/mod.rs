//! The re-authenticating API client.
//!
//! [`AuthClient`] sits between calling code and a [`Transport`]. It attaches
//! the session's bearer token to every request and, when the server answers
//! 401, refreshes the token once and replays the request. If the refresh is
//! refused the session is cleared and the user is sent back to login.

mod endpoints;
mod refresh;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, trace, warn};

use crate::credentials::LoginCredentials;
use crate::error::ApiError;
use crate::tokens::SessionCredentials;
use crate::traits::{Navigator, SessionStore, Transport};
use crate::types::{ApiRequest, ApiResponse, Method};

use endpoints::{LoginRequest, TokenResponse};
use refresh::RefreshGate;

pub use endpoints::{LOGIN, LOGOUT, REFRESH};

/// Message attached to a refresh failure the server answered with 403.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your login has expired.";

/// Configuration for [`AuthClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Path of the login endpoint.
    pub login_path: String,
    /// Path of the refresh endpoint.
    pub refresh_path: String,
    /// Path of the logout endpoint.
    pub logout_path: String,
    /// Share one refresh between concurrent requests rejected with the same
    /// token. When off, every rejected request refreshes on its own.
    pub coalesce_refresh: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            login_path: LOGIN.to_string(),
            refresh_path: REFRESH.to_string(),
            logout_path: LOGOUT.to_string(),
            coalesce_refresh: true,
        }
    }
}

impl ClientConfig {
    /// Override the refresh endpoint path.
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Override the login endpoint path.
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Override the logout endpoint path.
    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    /// Enable or disable single-flight refresh.
    pub fn with_coalesced_refresh(mut self, enabled: bool) -> Self {
        self.coalesce_refresh = enabled;
        self
    }
}

/// An API client that transparently re-authenticates.
///
/// Clients are cheap to clone (they use internal `Arc`) and are safe to
/// share across tasks. All clones share one session store and one refresh
/// gate.
///
/// Requests never panic: every failure, including a failed refresh, comes
/// back as an [`ApiError`].
pub struct AuthClient<T> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T> {
    transport: T,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    config: ClientConfig,
    refresh: RefreshGate,
}

impl<T> Clone for AuthClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> AuthClient<T> {
    /// Create a client over `transport`.
    ///
    /// # Arguments
    ///
    /// * `transport` - Performs the network calls
    /// * `store` - Holds the session credentials
    /// * `navigator` - Invoked when the session cannot be recovered
    /// * `config` - Endpoint paths and refresh policy
    pub fn new(
        transport: T,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        config: ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                store,
                navigator,
                config,
                refresh: RefreshGate::new(),
            }),
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the current session credentials, if logged in.
    pub fn session(&self) -> Option<SessionCredentials> {
        self.inner.store.get()
    }

    /// Send a request with the current bearer token attached.
    ///
    /// A 401 triggers exactly one refresh followed by exactly one replay of
    /// `request`; the replay's result is returned whatever it is. If the
    /// refresh fails, the session is cleared, the navigator redirects to
    /// login, and the refresh error is returned (annotated with
    /// [`SESSION_EXPIRED_MESSAGE`] when it was a 403). Every other result
    /// passes through unchanged.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn request(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let generation = self.inner.refresh.generation();

        let error = match self.send_authorized(request).await {
            Err(error) if error.is_unauthorized() => error,
            other => return other,
        };

        debug!(status = %error.status, "Access token rejected, re-authenticating");
        self.reauthenticate(generation).await?;

        debug!("Replaying request with refreshed token");
        self.send_authorized(request).await
    }

    /// Log in with a password and store the resulting session.
    ///
    /// # Errors
    ///
    /// Returns the server's error, or a parsing error if the response did not
    /// carry an access token. The stored session is left untouched on error.
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SessionCredentials, ApiError> {
        info!("Creating new session");

        let body = serde_json::to_value(LoginRequest {
            identifier: credentials.identifier(),
            password: credentials.password(),
        })
        .map_err(|e| ApiError::parsing(e.to_string()))?;

        let request = ApiRequest::post(&self.inner.config.login_path, body);
        let response = self.inner.transport.send(&request).await?;
        let session = TokenResponse::credentials(&response)?;

        self.inner.store.set(session.clone());
        debug!("Session created successfully");
        Ok(session)
    }

    /// Refresh the session now, without waiting for a 401.
    ///
    /// Failure is handled exactly as during a request: the session is cleared
    /// and the navigator redirects to login.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<SessionCredentials, ApiError> {
        self.reauthenticate(self.inner.refresh.generation()).await
    }

    /// End the session.
    ///
    /// The local session is cleared whatever the server answers; the server's
    /// error, if any, is still returned. No redirect happens: this is a
    /// deliberate logout, not an expired session.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        info!("Ending session");

        let request = ApiRequest::new(Method::Post, &self.inner.config.logout_path);
        let result = self.send_authorized(&request).await;

        self.inner.store.clear();

        if let Err(ref error) = result {
            warn!(error = %error, "Server-side logout failed; local session cleared anyway");
        }
        result.map(|_| ())
    }

    /// Send `request` with whatever token the store holds right now.
    async fn send_authorized(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        match self.inner.store.get() {
            Some(session) => {
                let mut outbound = request.clone();
                outbound.set_header("authorization", session.access_token.bearer());
                self.inner.transport.send(&outbound).await
            }
            None => {
                trace!("No session token; sending unauthenticated");
                self.inner.transport.send(request).await
            }
        }
    }

    async fn reauthenticate(&self, generation: u64) -> Result<SessionCredentials, ApiError> {
        if !self.inner.config.coalesce_refresh {
            return self.refresh_or_logout().await;
        }

        self.inner
            .refresh
            .run(generation, || self.refresh_or_logout())
            .await
    }

    /// One refresh attempt: store the new token, or tear the session down.
    async fn refresh_or_logout(&self) -> Result<SessionCredentials, ApiError> {
        info!("Refreshing session");

        // No bearer header: the transport supplies the ambient credential.
        let request = ApiRequest::get(&self.inner.config.refresh_path);
        let outcome = match self.inner.transport.send(&request).await {
            Ok(response) => TokenResponse::credentials(&response),
            Err(error) => Err(error),
        };

        match outcome {
            Ok(session) => {
                self.inner.store.set(session.clone());
                debug!("Session refreshed successfully");
                Ok(session)
            }
            Err(mut error) => {
                if error.is_forbidden() {
                    error = error.with_message(SESSION_EXPIRED_MESSAGE);
                }

                warn!(status = %error.status, "Session refresh failed, logging out");
                self.inner.store.clear();
                self.inner.navigator.redirect_to_login();
                Err(error)
            }
        }
    }
}

// Custom Debug impl that hides sensitive data
impl<T> fmt::Debug for AuthClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthClient")
            .field("config", &self.inner.config)
            .field("session", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests;
