//! Navigator trait.

/// Sends the user back to the login entry point.
///
/// Called once the session is unrecoverable. Implementations perform a hard
/// reset of the application shell, not an in-app transition.
pub trait Navigator: Send + Sync {
    /// Leave the current view and go to login.
    fn redirect_to_login(&self);
}
