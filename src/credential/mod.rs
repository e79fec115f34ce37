// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OAuth credentials and their persistence.
//!
//! A [`Credential`] is the token material returned by the OAuth token
//! endpoint. It is persisted through a [`CredentialStore`] under a
//! [`CredentialKey`] derived from the client identifier, so that later runs
//! can skip the interactive authorization.
//!
//! # Stores
//!
//! - [`FileCredentialStore`]: one JSON file per key in a directory
//! - [`MemoryCredentialStore`]: process-local map, mainly for tests

mod file_store;

pub use file_store::FileCredentialStore;

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Seconds before the expiry instant at which a credential stops being valid.
const EXPIRY_MARGIN_SECS: i64 = 10;

/// Key under which a client's credential is stored.
///
/// # Examples
///
/// ```
/// use smartthings_lib::credential::CredentialKey;
///
/// let key = CredentialKey::for_client("my-client");
/// assert_eq!(key.as_str(), "smartthings.token_my-client");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey(String);

impl CredentialKey {
    const PREFIX: &'static str = "smartthings.token";

    /// Derives the key for an OAuth client identifier.
    #[must_use]
    pub fn for_client(client_id: &str) -> Self {
        Self(format!("{}_{client_id}", Self::PREFIX))
    }

    /// Returns the key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// OAuth token material.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer access token.
    pub access_token: String,
    /// Token type reported by the service, usually `bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Refresh token, if the service issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry instant. `None` means the token does not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Credential {
    /// Creates a non-expiring credential from an access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            refresh_token: None,
            expiry: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the expiry instant.
    #[must_use]
    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Returns `true` if the access token is set and not about to expire.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Same as [`is_valid`](Self::is_valid) against a fixed instant.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        self.expiry
            .is_none_or(|expiry| now + TimeDelta::seconds(EXPIRY_MARGIN_SECS) < expiry)
    }

    /// Returns `true` if the credential can be renewed without user interaction.
    #[must_use]
    pub fn is_refreshable(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

// Token material stays out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Durable storage for credentials.
///
/// Implementations must be safe to share between threads; the transport
/// saves refreshed credentials from whatever task performs the refresh.
pub trait CredentialStore: Send + Sync {
    /// Loads the credential stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the stored credential cannot be read.
    fn load(&self, key: &CredentialKey) -> Result<Option<Credential>, AuthError>;

    /// Stores `credential` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the credential cannot be written.
    fn save(&self, key: &CredentialKey, credential: &Credential) -> Result<(), AuthError>;
}

/// In-memory credential store.
///
/// # Examples
///
/// ```
/// use smartthings_lib::credential::{Credential, CredentialKey, CredentialStore, MemoryCredentialStore};
///
/// let store = MemoryCredentialStore::new();
/// let key = CredentialKey::for_client("abc");
/// store.save(&key, &Credential::new("token")).unwrap();
/// assert_eq!(store.load(&key).unwrap().unwrap().access_token, "token");
/// ```
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<CredentialKey, Credential>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding a single credential.
    #[must_use]
    pub fn with_credential(key: CredentialKey, credential: Credential) -> Self {
        let store = Self::new();
        store.entries.lock().insert(key, credential);
        store
    }

    /// Returns the number of stored credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, key: &CredentialKey) -> Result<Option<Credential>, AuthError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &CredentialKey, credential: &Credential) -> Result<(), AuthError> {
        self.entries.lock().insert(key.clone(), credential.clone());
        Ok(())
    }
}
