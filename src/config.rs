// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session configuration.

use std::time::Duration;

use crate::credential::CredentialKey;

/// Configuration for connecting to the SmartThings API.
///
/// Holds the OAuth client registration and the connection parameters used
/// by the transport. All service URLs are derived from a single API base so
/// that a test server can stand in for the real service.
///
/// # Examples
///
/// ```
/// use smartthings_lib::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::new("client-id", "client-secret")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(
///     config.token_url(),
///     "https://graph.api.smartthings.com/oauth/token"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    client_id: String,
    secret: String,
    api_base: String,
    redirect_url: String,
    scope: String,
    timeout: Duration,
}

impl SessionConfig {
    /// Default API base.
    pub const DEFAULT_API_BASE: &'static str = "https://graph.api.smartthings.com";
    /// Default OAuth redirect, served by
    /// [`LocalCallbackServer`](crate::auth::LocalCallbackServer).
    pub const DEFAULT_REDIRECT_URL: &'static str = "http://localhost:4567/OAuthCallback";
    /// Default OAuth scope.
    pub const DEFAULT_SCOPE: &'static str = "app";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the given OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            secret: secret.into(),
            api_base: Self::DEFAULT_API_BASE.to_string(),
            redirect_url: Self::DEFAULT_REDIRECT_URL.to_string(),
            scope: Self::DEFAULT_SCOPE.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the API base URL. A trailing slash is ignored.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into();
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Sets the OAuth redirect URL.
    #[must_use]
    pub fn with_redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.redirect_url = redirect_url.into();
        self
    }

    /// Sets the OAuth scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the OAuth client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth client secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Returns the OAuth redirect URL.
    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    /// Returns the OAuth scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the key under which this client's credential is stored.
    #[must_use]
    pub fn credential_key(&self) -> CredentialKey {
        CredentialKey::for_client(&self.client_id)
    }

    /// OAuth authorization endpoint.
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!("{}/oauth/authorize", self.api_base)
    }

    /// OAuth token endpoint.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.api_base)
    }

    /// SmartApp endpoint discovery URL.
    #[must_use]
    pub fn endpoints_url(&self) -> String {
        format!("{}/api/smartapps/endpoints", self.api_base)
    }
}
