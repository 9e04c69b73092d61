//! Registered queries and mutations over an [`AuthClient`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::client::AuthClient;
use crate::error::ApiError;
use crate::traits::Transport;
use crate::types::{ApiRequest, ApiResponse};

use super::store::QueryCache;
use super::tags::Tag;

/// A read endpoint whose results are cached.
///
/// ```
/// use concierge_core::{ApiRequest, QueryDef, Tag};
///
/// const OFFER: QueryDef<u32> = QueryDef {
///     name: "getOffer",
///     request: |id| ApiRequest::get(format!("/offers/{}", id)),
///     provides: |id, _| vec![Tag::with_id("Offer", id)],
/// };
/// # let _ = OFFER;
/// ```
pub struct QueryDef<A> {
    /// Unique endpoint name, part of the cache key.
    pub name: &'static str,
    /// Builds the request for the given arguments.
    pub request: fn(&A) -> ApiRequest,
    /// Tags the result provides.
    pub provides: fn(&A, &ApiResponse) -> Vec<Tag>,
}

/// A write endpoint that invalidates cached queries on success.
pub struct MutationDef<A> {
    /// Endpoint name, for logging.
    pub name: &'static str,
    /// Builds the request for the given arguments.
    pub request: fn(&A) -> ApiRequest,
    /// Tags to invalidate once the mutation succeeds.
    pub invalidates: fn(&A) -> Vec<Tag>,
}

/// Endpoint registry: runs queries through the cache and mutations through
/// invalidation, with every request going through the [`AuthClient`].
pub struct Api<T> {
    client: AuthClient<T>,
    cache: Arc<QueryCache>,
}

impl<T> Clone for Api<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<T: Transport> Api<T> {
    /// Create a registry with a default cache.
    pub fn new(client: AuthClient<T>) -> Self {
        Self::with_cache(client, QueryCache::new())
    }

    /// Create a registry with a custom cache.
    pub fn with_cache(client: AuthClient<T>, cache: QueryCache) -> Self {
        Self {
            client,
            cache: Arc::new(cache),
        }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &AuthClient<T> {
        &self.client
    }

    /// Returns the query cache.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Run a query, answering from the cache when possible.
    ///
    /// Only successful responses are cached, and only if no mutation
    /// invalidated their tags while the request was in flight.
    #[instrument(skip_all, fields(endpoint = def.name))]
    pub async fn query<A: Serialize>(
        &self,
        def: &QueryDef<A>,
        args: &A,
    ) -> Result<ApiResponse, ApiError> {
        let key = cache_key(def.name, args)?;

        if let Some(cached) = self.cache.get(&key) {
            trace!(%key, "Cache hit");
            return Ok(cached);
        }

        let since = self.cache.epoch();
        let response = self.client.request(&(def.request)(args)).await?;
        let tags = (def.provides)(args, &response);
        if !self.cache.insert_since(key, response.clone(), tags, since) {
            debug!("Invalidated while in flight, not caching");
        }

        Ok(response)
    }

    /// Run a mutation and, if it succeeds, invalidate the tags it declares.
    #[instrument(skip_all, fields(endpoint = def.name))]
    pub async fn mutate<A>(&self, def: &MutationDef<A>, args: &A) -> Result<ApiResponse, ApiError> {
        let response = self.client.request(&(def.request)(args)).await?;

        let tags = (def.invalidates)(args);
        let evicted = self.cache.invalidate(&tags);
        debug!(evicted, "Invalidated cached queries");

        Ok(response)
    }

    /// Invalidate tags by hand.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        self.cache.invalidate(tags)
    }

    /// Drop every cached result.
    pub fn reset(&self) {
        self.cache.clear();
    }

    /// Log out and drop every cached result.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.client.logout().await;
        self.reset();
        result
    }
}

fn cache_key<A: Serialize>(name: &str, args: &A) -> Result<String, ApiError> {
    let args = serde_json::to_string(args).map_err(|e| ApiError::parsing(e.to_string()))?;
    Ok(format!("{}({})", name, args))
}
