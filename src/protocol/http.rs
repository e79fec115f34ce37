// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bearer-token HTTP transport.

use std::fmt;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;

use crate::auth::OAuthClient;
use crate::config::SessionConfig;
use crate::credential::{Credential, CredentialKey, CredentialStore};
use crate::error::{AuthError, Error, NetworkError, Result};
use crate::protocol::{ApiResponse, Transport};

/// HTTP transport that authenticates every request with a bearer token.
///
/// The transport owns the live credential. When it is about to expire the
/// transport refreshes it through the token endpoint before sending the
/// request, and writes the new credential back to the store. The refresh is
/// serialized by an async mutex, so concurrent requests trigger at most one
/// token request.
pub struct HttpTransport {
    client: Client,
    oauth: OAuthClient,
    store: Arc<dyn CredentialStore>,
    key: CredentialKey,
    credential: Mutex<Credential>,
}

impl HttpTransport {
    /// Creates a transport for `config` using `credential`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        config: &SessionConfig,
        credential: Credential,
        store: Arc<dyn CredentialStore>,
    ) -> std::result::Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self {
            oauth: OAuthClient::with_client(client.clone(), config),
            client,
            store,
            key: config.credential_key(),
            credential: Mutex::new(credential),
        })
    }

    /// Returns a copy of the credential currently in use.
    pub async fn credential(&self) -> Credential {
        self.credential.lock().await.clone()
    }

    /// Returns a usable access token, refreshing the credential if needed.
    async fn access_token(&self) -> Result<String> {
        let mut credential = self.credential.lock().await;

        if !credential.is_valid() {
            if !credential.is_refreshable() {
                return Err(AuthError::Expired.into());
            }

            let renewed = self.oauth.refresh(&credential).await?;
            if let Err(e) = self.store.save(&self.key, &renewed) {
                // The renewed credential still works for this process.
                tracing::warn!(key = %self.key, error = %e, "Failed to persist refreshed credential");
            }
            tracing::info!(key = %self.key, "Credential refreshed");
            *credential = renewed;
        }

        Ok(credential.access_token.clone())
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    async fn get(&self, uri: &str) -> Result<ApiResponse> {
        let token = self.access_token().await?;

        tracing::debug!(uri = %uri, "Sending HTTP request");

        let response = self
            .client
            .get(uri)
            .bearer_auth(token)
            .send()
            .await
            .map_err(NetworkError::Http)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Network(NetworkError::Unauthorized));
        }

        if !response.status().is_success() {
            return Err(Error::Network(NetworkError::Status {
                status: response.status().as_u16(),
                reason: response
                    .status()
                    .canonical_reason()
                    .unwrap_or("Unknown")
                    .to_string(),
            }));
        }

        let body = response.text().await.map_err(NetworkError::Http)?;

        tracing::debug!(body = %body, "Received HTTP response");

        Ok(ApiResponse::new(body))
    }
}
