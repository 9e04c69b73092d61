//! Session store trait.

use crate::tokens::SessionCredentials;

/// Holds the credentials of the current session.
///
/// Reads and writes are synchronous and must be visible to the next read
/// immediately.
pub trait SessionStore: Send + Sync {
    /// Returns the current credentials, if logged in.
    fn get(&self) -> Option<SessionCredentials>;

    /// Replace the current credentials.
    fn set(&self, credentials: SessionCredentials);

    /// Forget the current credentials.
    fn clear(&self);
}
