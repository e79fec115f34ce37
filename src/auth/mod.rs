// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OAuth 2.0 authorization-code flow.
//!
//! [`OAuthClient`] talks to the service's token endpoint: it exchanges an
//! authorization code for a [`Credential`] and refreshes expired ones.
//! Obtaining the code itself requires the user to log in through a browser;
//! that step goes through an [`AuthorizationCodeSource`], whose default
//! implementation is [`LocalCallbackServer`].

mod callback;

pub use callback::{AuthorizationCodeSource, LocalCallbackServer, PendingCallback};

use chrono::{TimeDelta, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::config::SessionConfig;
use crate::credential::Credential;
use crate::error::{AuthError, NetworkError};

/// Body of a successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_credential(self, previous_refresh: Option<&str>) -> Credential {
        let mut credential = Credential::new(self.access_token);
        if let Some(token_type) = self.token_type {
            credential.token_type = token_type;
        }
        // A refresh response may omit the refresh token; the old one stays usable.
        credential.refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string));
        credential.expiry = self
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + TimeDelta::seconds(secs));
        credential
    }
}

/// Client for the OAuth authorization and token endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: Client,
    client_id: String,
    secret: String,
    authorize_url: String,
    token_url: String,
    redirect_url: String,
    scope: String,
}

impl OAuthClient {
    /// Creates a client from a session configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &SessionConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(NetworkError::Http)?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a client reusing an existing `reqwest` client.
    #[must_use]
    pub fn with_client(client: Client, config: &SessionConfig) -> Self {
        Self {
            client,
            client_id: config.client_id().to_string(),
            secret: config.secret().to_string(),
            authorize_url: config.authorize_url(),
            token_url: config.token_url(),
            redirect_url: config.redirect_url().to_string(),
            scope: config.scope().to_string(),
        }
    }

    /// Builds the URL the user must visit to grant access.
    ///
    /// `state` is echoed back on the redirect and must be checked by the
    /// code source.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode(&self.scope),
            urlencoding::encode(state),
        )
    }

    /// Exchanges an authorization code for a credential.
    ///
    /// # Errors
    ///
    /// Returns error if the token endpoint is unreachable, rejects the code,
    /// or answers with an unreadable body.
    pub async fn exchange_code(&self, code: &str) -> Result<Credential, AuthError> {
        tracing::debug!("Exchanging authorization code");
        self.request_token(
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.redirect_url),
                ("client_id", &self.client_id),
                ("client_secret", &self.secret),
            ],
            None,
        )
        .await
    }

    /// Obtains a fresh credential using the refresh token of `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Expired`] if `credential` has no refresh token,
    /// or any error from the token endpoint.
    pub async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Expired)?;

        tracing::debug!("Refreshing expired credential");
        self.request_token(
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.client_id),
                ("client_secret", &self.secret),
            ],
            Some(refresh_token),
        )
        .await
    }

    async fn request_token(
        &self,
        params: &[(&str, &str)],
        previous_refresh: Option<&str>,
    ) -> Result<Credential, AuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(AuthError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(AuthError::Http)?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Token request rejected");
            return Err(AuthError::TokenRejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(AuthError::InvalidTokenResponse)?;
        Ok(token.into_credential(previous_refresh))
    }
}
