//! In-memory session store.

use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::tokens::SessionCredentials;
use crate::traits::SessionStore;

/// Process-wide session state held in memory.
///
/// The default store: it lives as long as the client and is lost on exit.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    credentials: RwLock<Option<SessionCredentials>>,
}

impl MemorySessionStore {
    /// Create an empty (logged out) store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that starts out logged in.
    pub fn with_credentials(credentials: SessionCredentials) -> Self {
        Self {
            credentials: RwLock::new(Some(credentials)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<SessionCredentials> {
        // A panic while holding the lock cannot leave a half-written Option.
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, credentials: SessionCredentials) {
        debug!("Storing session credentials");
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
    }

    fn clear(&self) {
        debug!("Clearing session credentials");
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}
