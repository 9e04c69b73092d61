//! On-disk layout of the CLI's state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use concierge_file::write_private;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CONCIERGE_DATA_DIR";

/// Which API the saved session belongs to, plus the refresh cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub api: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
}

/// Get (and create) the data directory.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => ProjectDirs::from("", "", "concierge")
            .context("Could not determine data directory")?
            .data_dir()
            .to_path_buf(),
    };

    fs::create_dir_all(&dir).context("Failed to create data directory")?;
    Ok(dir)
}

/// Get the session file path.
pub fn session_path(dir: &Path) -> PathBuf {
    dir.join("session.json")
}

fn profile_path(dir: &Path) -> PathBuf {
    dir.join("profile.json")
}

/// Load the saved profile, if any.
pub fn load_profile(dir: &Path) -> Result<Option<Profile>> {
    let path = profile_path(dir);
    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context("Failed to read profile file"),
    };

    let profile = serde_json::from_str(&json).context("Invalid profile file")?;
    Ok(Some(profile))
}

/// Save the profile (owner-only, it carries the refresh cookie).
pub fn save_profile(dir: &Path, profile: &Profile) -> Result<()> {
    let json = serde_json::to_vec_pretty(profile)?;
    write_private(&profile_path(dir), &json).context("Failed to write profile file")
}

/// Remove the saved profile.
pub fn clear_profile(dir: &Path) -> Result<()> {
    match fs::remove_file(profile_path(dir)) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            Err(e).context("Failed to remove profile file")
        }
        _ => Ok(()),
    }
}
