//! HTTP transport implementation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use concierge_core::error::InvalidInputError;
use concierge_core::{ApiError, ApiRequest, ApiResponse, BaseUrl, Error, Method, Transport};

/// Request timeout used unless the builder overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport that sends requests over HTTP(S) with reqwest.
///
/// Cookies set by the server (for example by the login endpoint) are kept in
/// an in-process jar and sent back automatically; this is the ambient
/// credential the refresh endpoint relies on. The jar can be exported and
/// restored to carry the session across processes.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: BaseUrl,
    cookies: Arc<Jar>,
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    base: BaseUrl,
    timeout: Duration,
    user_agent: String,
}

impl HttpTransportBuilder {
    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn build(self) -> Result<HttpTransport, Error> {
        let cookies = Arc::new(Jar::default());

        let client = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|e| Error::ClientSetup {
                message: e.to_string(),
            })?;

        Ok(HttpTransport {
            client,
            base: self.base,
            cookies,
        })
    }
}

impl HttpTransport {
    /// Create a transport for the given API with default settings.
    pub fn new(base: BaseUrl) -> Result<Self, Error> {
        Self::builder(base).build()
    }

    /// Start configuring a transport for the given API.
    pub fn builder(base: BaseUrl) -> HttpTransportBuilder {
        HttpTransportBuilder {
            base,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("concierge/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Returns the API base URL this transport is configured for.
    pub fn base_url(&self) -> &BaseUrl {
        &self.base
    }

    /// Export the cookies that would be sent to `path`, as a `Cookie` header
    /// value.
    ///
    /// # Security
    ///
    /// The result can contain session credentials. Persist it like a token.
    pub fn export_cookies(&self, path: &str) -> Option<String> {
        let url = self.url_for(path).ok()?;
        let header = self.cookies.cookies(&url)?;
        header.to_str().ok().map(str::to_string)
    }

    /// Restore cookies previously returned by [`export_cookies`](Self::export_cookies)
    /// for the same `path`.
    pub fn restore_cookies(&self, path: &str, header: &str) -> Result<(), Error> {
        let url = self.url_for(path)?;
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.cookies.add_cookie_str(pair, &url);
        }
        debug!(%url, "Restored cookies");
        Ok(())
    }

    fn url_for(&self, path: &str) -> Result<Url, Error> {
        let joined = self.base.join(path);
        Url::parse(&joined).map_err(|e| {
            InvalidInputError::BaseUrl {
                value: joined,
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Turn an HTTP response into the response envelope.
    async fn handle_response(&self, response: reqwest::Response) -> Result<ApiResponse, ApiError> {
        let status = response.status();
        trace!(status = %status, "HTTP response");

        let text = response.text().await.map_err(map_reqwest_error)?;
        let data = parse_body(&text);

        if status.is_success() {
            Ok(ApiResponse::new(status.as_u16(), data))
        } else {
            Err(ApiError::http(status.as_u16(), data))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(api = %self.base, method = %request.method, path = %request.path))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.base.join(&request.path);
        debug!(%url, "HTTP request");

        let mut builder = self.client.request(to_reqwest(request.method), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        self.handle_response(response).await
    }
}

// Custom Debug impl that hides the cookie jar
impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base", &self.base)
            .field("cookies", &"[REDACTED]")
            .finish()
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::timeout(err.to_string())
    } else {
        ApiError::fetch(err.to_string())
    }
}

/// JSON when it parses, the raw text when it doesn't, `null` when empty.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
