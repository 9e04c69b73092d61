//! concierge-core - Core types, ports and the re-authenticating API client.
//!
//! Every authenticated call flows through an [`AuthClient`], which attaches the
//! current bearer token, recovers from an expired token with a single refresh,
//! and logs the user out when the refresh is refused.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use concierge_core::{ApiRequest, AuthClient, ClientConfig, MemorySessionStore};
//! # use concierge_core::{Navigator, Transport};
//!
//! # async fn example<T: Transport, N: Navigator + 'static>(transport: T, navigator: N) {
//! let client = AuthClient::new(
//!     transport,
//!     Arc::new(MemorySessionStore::new()),
//!     Arc::new(navigator),
//!     ClientConfig::default(),
//! );
//!
//! match client.request(&ApiRequest::get("/gallery")).await {
//!     Ok(response) => println!("{}", response.data),
//!     Err(error) => eprintln!("{error}"),
//! }
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod credentials;
pub mod error;
pub mod session;
pub mod tokens;
pub mod traits;
pub mod types;

pub use cache::{Api, MutationDef, QueryCache, QueryDef, Tag};
pub use client::{AuthClient, ClientConfig, SESSION_EXPIRED_MESSAGE};
pub use credentials::LoginCredentials;
pub use error::{ApiError, Error, ErrorStatus};
pub use session::MemorySessionStore;
pub use tokens::{AccessToken, SessionCredentials};
pub use traits::{Navigator, SessionStore, Transport};
pub use types::{ApiRequest, ApiResponse, BaseUrl, Method};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
