//! Filesystem session store.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use fs2::FileExt;
use tracing::{debug, instrument, warn};

use concierge_core::{Error, SessionCredentials, SessionStore};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

fn map_io(err: io::Error) -> Error {
    Error::Storage {
        message: format!("IO error: {}", err),
    }
}

/// Session store persisted as a JSON file.
///
/// The in-memory copy is authoritative: `get` never touches the disk, and a
/// failed write leaves the process logged in with the new credentials while
/// logging a warning.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    credentials: RwLock<Option<SessionCredentials>>,
}

impl FileSessionStore {
    /// Open the store at `path`, loading any session saved there.
    ///
    /// A missing file means logged out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file exists but cannot be read or
    /// does not contain a session.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        let credentials = match fs::read_to_string(&path) {
            Ok(json) => {
                let credentials: SessionCredentials =
                    serde_json::from_str(&json).map_err(|e| Error::Storage {
                        message: format!("invalid session file {}: {}", path.display(), e),
                    })?;
                debug!("Loaded saved session");
                Some(credentials)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(map_io(e)),
        };

        Ok(Self {
            path,
            credentials: RwLock::new(credentials),
        })
    }

    /// Get the session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, credentials: &SessionCredentials) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(credentials).map_err(|e| Error::Storage {
            message: e.to_string(),
        })?;
        write_private(&self.path, &json).map_err(map_io)
    }

    fn remove(&self) -> Result<(), Error> {
        with_lock(&self.path, || match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .map_err(map_io)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<SessionCredentials> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, credentials: SessionCredentials) {
        // Held across the write so disk and memory change together.
        let mut current = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Err(e) = self.persist(&credentials) {
            warn!(path = %self.path.display(), error = %e, "Failed to save session");
        } else {
            debug!(path = %self.path.display(), "Saved session");
        }
        *current = Some(credentials);
    }

    fn clear(&self) {
        let mut current = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Err(e) = self.remove() {
            warn!(path = %self.path.display(), error = %e, "Failed to remove session file");
        } else {
            debug!(path = %self.path.display(), "Removed session file");
        }
        *current = None;
    }
}

/// Replace the file at `path` with `contents`, readable only by the owner.
///
/// Writers are serialised with an exclusive lock on a sibling `.lock` file and
/// the content lands via a temp file and rename, so readers never see a
/// partial file.
pub fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    with_lock(path, || {
        let tmp = sibling(path, ".tmp");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;

        // Restrict before writing so the secret is never world-readable.
        #[cfg(unix)]
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;

        file.write_all(contents)?;
        file.sync_data()?;
        fs::rename(&tmp, path)
    })
}

fn with_lock<T>(path: &Path, f: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(sibling(path, ".lock"))?;

    lock_file.lock_exclusive()?;
    let result = f();
    lock_file.unlock()?;

    result
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
