//! CLI session context: the client wired to on-disk state.

pub mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use concierge_core::{AuthClient, BaseUrl, ClientConfig, SessionStore};
use concierge_file::FileSessionStore;
use concierge_http::HttpTransport;

use crate::navigator::TerminalNavigator;
use storage::Profile;

/// API used when neither `--api` nor a saved session names one.
pub const DEFAULT_API: &str = "http://localhost:3500";

/// Everything a command needs to talk to the API.
pub struct CliContext {
    dir: PathBuf,
    api: BaseUrl,
    store: Arc<FileSessionStore>,
    navigator: Arc<TerminalNavigator>,
    client: AuthClient<HttpTransport>,
}

impl CliContext {
    /// Open the saved session.
    ///
    /// Fails if `api` names a different API than the one the saved session
    /// belongs to, so a token is never sent to the wrong server.
    pub fn open(api: Option<&str>) -> Result<Self> {
        Self::build(api, false)
    }

    /// Open a context for logging in, discarding a session that belongs to
    /// another API.
    pub fn for_login(api: Option<&str>) -> Result<Self> {
        Self::build(api, true)
    }

    fn build(api: Option<&str>, switching: bool) -> Result<Self> {
        let dir = storage::data_dir()?;
        let profile = storage::load_profile(&dir)?;
        let store = Arc::new(
            FileSessionStore::open(storage::session_path(&dir))
                .context("Failed to load session")?,
        );

        let saved_api = profile.as_ref().map(|p| p.api.as_str());
        let api = BaseUrl::new(api.or(saved_api).unwrap_or(DEFAULT_API))
            .context("Invalid API URL")?;

        let same_api = saved_api.is_some_and(|saved| saved == api.as_str());
        if !same_api && store.get().is_some() {
            if !switching {
                bail!(
                    "The saved session belongs to {}. Pass --api {} or run 'concierge login' again.",
                    saved_api.unwrap_or("another API"),
                    saved_api.unwrap_or("<url>"),
                );
            }
            warn!(api = %api, "Discarding session for a different API");
            store.clear();
        }

        let transport = HttpTransport::new(api.clone()).context("Failed to create HTTP client")?;
        let config = ClientConfig::default();
        if same_api && let Some(cookies) = profile.as_ref().and_then(|p| p.cookies.as_deref()) {
            transport
                .restore_cookies(&config.refresh_path, cookies)
                .context("Failed to restore cookies")?;
            debug!("Restored refresh cookie");
        }

        let navigator = Arc::new(TerminalNavigator::new());
        let client = AuthClient::new(transport, store.clone(), navigator.clone(), config);

        Ok(Self {
            dir,
            api,
            store,
            navigator,
            client,
        })
    }

    pub fn api(&self) -> &BaseUrl {
        &self.api
    }

    pub fn client(&self) -> &AuthClient<HttpTransport> {
        &self.client
    }

    pub fn navigator(&self) -> &TerminalNavigator {
        &self.navigator
    }

    /// Save the API and the refresh cookie for the next run.
    ///
    /// Once the session is gone the profile is removed as well.
    pub fn persist(&self) -> Result<()> {
        if self.store.get().is_none() {
            return storage::clear_profile(&self.dir);
        }

        let refresh_path = &self.client.config().refresh_path;
        let profile = Profile {
            api: self.api.to_string(),
            cookies: self.client.transport().export_cookies(refresh_path),
        };
        storage::save_profile(&self.dir, &profile)
    }
}
