//! Bearer credential storage.
//!
//! The token lives in a single file under a fixed name in the platform
//! data directory.  Every transport call reads it; only the auth flow
//! writes it.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;

use causerie_shared::constants::TOKEN_FILE_NAME;

use crate::error::{NetError, Result};

/// Handle to the on-disk bearer credential.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Open the default store in the platform data directory.
    pub fn open() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "causerie", "causerie").ok_or(NetError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        fs::create_dir_all(data_dir)?;

        Ok(Self {
            path: data_dir.join(TOKEN_FILE_NAME),
        })
    }

    /// Open a store at an explicit path.  Useful for tests and custom
    /// directory layouts.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the stored token, if any.
    pub fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(_) => None,
        }
    }

    /// Persist a new token, replacing any previous one.
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        tracing::debug!(path = %self.path.display(), "Stored bearer credential");
        Ok(())
    }

    /// Remove the stored token.  A missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
