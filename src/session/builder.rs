// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session builder.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{AuthorizationCodeSource, LocalCallbackServer, OAuthClient};
use crate::config::SessionConfig;
use crate::credential::{Credential, CredentialKey, CredentialStore, FileCredentialStore};
use crate::error::Result;
use crate::protocol::HttpTransport;
use crate::session::{Session, discover_endpoint};

/// Builder for establishing a [`Session`].
///
/// By default the credential is kept in a file in the user's home directory
/// and a missing credential is obtained through a [`LocalCallbackServer`]
/// listening on the configured redirect URL.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use smartthings_lib::credential::FileCredentialStore;
/// use smartthings_lib::{Session, SessionConfig};
///
/// # async fn example() -> smartthings_lib::Result<()> {
/// let config = SessionConfig::new("client-id", "secret");
/// let session = Session::builder(config)
///     .with_credential_store(Arc::new(FileCredentialStore::new("/var/lib/smartthings")))
///     .connect()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder<C = LocalCallbackServer> {
    config: SessionConfig,
    store: Option<Arc<dyn CredentialStore>>,
    code_source: C,
}

impl SessionBuilder {
    /// Creates a builder with the default store and code source.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let code_source = LocalCallbackServer::new(config.redirect_url());
        Self {
            config,
            store: None,
            code_source,
        }
    }
}

impl<C: AuthorizationCodeSource> SessionBuilder<C> {
    /// Sets where the credential is loaded from and saved to.
    #[must_use]
    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets how a new authorization code is obtained.
    #[must_use]
    pub fn with_code_source<D: AuthorizationCodeSource>(self, code_source: D) -> SessionBuilder<D> {
        SessionBuilder {
            config: self.config,
            store: self.store,
            code_source,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Establishes the session.
    ///
    /// 1. Loads the stored credential. A usable one is taken as is, an
    ///    expired one is refreshed if it carries a refresh token, and
    ///    anything else starts the authorization-code flow. A new
    ///    credential is saved to the store.
    /// 2. Resolves the installation endpoint.
    /// 3. Fetches every device.
    ///
    /// # Errors
    ///
    /// Returns error if any step fails; no partial session is returned.
    pub async fn connect(self) -> Result<Session> {
        let store = match self.store.clone() {
            Some(store) => store,
            None => Arc::new(FileCredentialStore::in_home_dir()?),
        };
        let key = self.config.credential_key();
        let oauth = OAuthClient::new(&self.config)?;

        let credential = self.resolve_credential(&oauth, store.as_ref(), &key).await?;
        let transport = HttpTransport::new(&self.config, credential, store)?;

        let endpoint = discover_endpoint(&transport, &self.config.endpoints_url()).await?;
        let session = Session::from_transport(transport, endpoint);
        session.refresh().await?;

        tracing::info!(
            endpoint = %session.endpoint(),
            devices = session.devices().len(),
            "Session established"
        );
        Ok(session)
    }

    async fn resolve_credential(
        &self,
        oauth: &OAuthClient,
        store: &dyn CredentialStore,
        key: &CredentialKey,
    ) -> Result<Credential> {
        match store.load(key) {
            Ok(Some(credential)) if credential.is_valid() => {
                tracing::debug!(key = %key, "Using stored credential");
                return Ok(credential);
            }
            Ok(Some(credential)) if credential.is_refreshable() => {
                match oauth.refresh(&credential).await {
                    Ok(renewed) => {
                        store.save(key, &renewed)?;
                        tracing::info!(key = %key, "Stored credential refreshed");
                        return Ok(renewed);
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Failed to refresh stored credential");
                    }
                }
            }
            Ok(Some(_)) => tracing::info!(key = %key, "Stored credential expired"),
            Ok(None) => tracing::debug!(key = %key, "No stored credential"),
            Err(e) => tracing::warn!(key = %key, error = %e, "Failed to load stored credential"),
        }

        let state = Uuid::new_v4().to_string();
        let authorize_url = oauth.authorization_url(&state);
        let code = self
            .code_source
            .authorization_code(&authorize_url, &state)
            .await?;

        let credential = oauth.exchange_code(&code).await?;
        store.save(key, &credential)?;
        tracing::info!(key = %key, "Authorization complete");
        Ok(credential)
    }
}

impl<C> std::fmt::Debug for SessionBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("custom_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
