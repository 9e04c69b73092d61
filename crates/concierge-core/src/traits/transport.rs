//! Transport trait.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{ApiRequest, ApiResponse};

/// Performs the actual network call.
///
/// Implementations normalise every outcome into the response envelope: 2xx
/// into [`ApiResponse`], anything else (including network failure) into
/// [`ApiError`]. Any ambient credential, such as a session cookie, is the
/// transport's business and is attached without the caller asking.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the normalised result.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        (**self).send(request).await
    }
}
