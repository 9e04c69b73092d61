//! Single-flight coordination of token refreshes.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ApiError;
use crate::tokens::SessionCredentials;

type Outcome = Result<SessionCredentials, ApiError>;

/// Lets concurrent requests that were rejected with the same token share one
/// refresh.
///
/// Each request snapshots [`RefreshGate::generation`] before it is sent. The
/// generation advances after every completed refresh, once the new
/// credentials are already in the session store. A rejected request whose
/// snapshot is older than the current generation was sent with a token that
/// has since been replaced (or cleared), so it takes the published outcome
/// instead of refreshing again.
#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
    generation: AtomicU64,
    last: Mutex<Option<Outcome>>,
}

impl RefreshGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The number of refreshes completed so far.
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Run `refresh` unless a refresh newer than `observed` already finished.
    ///
    /// If the caller is dropped while `refresh` is pending, nothing is
    /// published and the next waiter runs its own refresh.
    pub(crate) async fn run<F, Fut>(&self, observed: u64, refresh: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let mut last = self.last.lock().await;

        if self.generation() != observed
            && let Some(outcome) = last.as_ref()
        {
            debug!("Reusing outcome of a concurrent refresh");
            return outcome.clone();
        }

        let outcome = refresh().await;
        *last = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }
}
