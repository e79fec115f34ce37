// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File-backed credential store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::credential::{Credential, CredentialKey, CredentialStore};
use crate::error::AuthError;

/// Stores each credential as a JSON file in a directory.
///
/// The file for a key is `<dir>/.<key>.json`. On Unix the file is created
/// with mode `0600`, replacing any existing file atomically.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a store rooted at the current user's home directory.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the home directory cannot be determined.
    pub fn in_home_dir() -> Result<Self, AuthError> {
        dirs::home_dir().map(Self::new).ok_or_else(|| AuthError::Store {
            key: String::new(),
            message: "failed to determine home directory".to_string(),
        })
    }

    /// Returns the directory holding the credential files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path used for `key`.
    #[must_use]
    pub fn path_for(&self, key: &CredentialKey) -> PathBuf {
        self.dir.join(format!(".{key}.json"))
    }
}

fn store_error(key: &CredentialKey, message: impl ToString) -> AuthError {
    AuthError::Store {
        key: key.to_string(),
        message: message.to_string(),
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, key: &CredentialKey) -> Result<Option<Credential>, AuthError> {
        let path = self.path_for(key);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No stored credential");
                return Ok(None);
            }
            Err(e) => return Err(store_error(key, e)),
        };

        let credential = serde_json::from_str(&content).map_err(|e| store_error(key, e))?;
        tracing::debug!(path = %path.display(), "Loaded stored credential");
        Ok(Some(credential))
    }

    fn save(&self, key: &CredentialKey, credential: &Credential) -> Result<(), AuthError> {
        let path = self.path_for(key);
        let content =
            serde_json::to_string_pretty(credential).map_err(|e| store_error(key, e))?;

        // Renamed over the target once fully written.
        let mut file = NamedTempFile::new_in(&self.dir).map_err(|e| store_error(key, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| store_error(key, e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600))
                .map_err(|e| store_error(key, e))?;
        }
        file.persist(&path).map_err(|e| store_error(key, e.error))?;

        tracing::debug!(path = %path.display(), "Saved credential");
        Ok(())
    }
}
