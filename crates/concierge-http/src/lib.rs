//! concierge-http - reqwest-backed transport.
//!
//! [`HttpTransport`] performs the network calls for an
//! [`AuthClient`](concierge_core::AuthClient). It keeps a cookie jar, which is
//! how the refresh endpoint recognises the session without a bearer token.

mod transport;

pub use transport::{DEFAULT_TIMEOUT, HttpTransport, HttpTransportBuilder};
