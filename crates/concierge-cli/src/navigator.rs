//! Terminal stand-in for the login redirect.

use std::sync::atomic::{AtomicBool, Ordering};

use concierge_core::Navigator;

use crate::output;

/// Tells the user to log in again once the session cannot be renewed.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    redirected: AtomicBool,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session ended during this run.
    pub fn redirected(&self) -> bool {
        self.redirected.load(Ordering::SeqCst)
    }
}

impl Navigator for TerminalNavigator {
    fn redirect_to_login(&self) {
        // Concurrent failures print the notice once.
        if !self.redirected.swap(true, Ordering::SeqCst) {
            output::error("Session ended. Run 'concierge login' to sign in again.");
        }
    }
}
