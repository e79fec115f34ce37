// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport used to reach the service's REST endpoints.
//!
//! Every request the library makes against the device API is an
//! authenticated HTTP GET on an absolute URI, so the [`Transport`] trait has
//! a single operation. [`HttpTransport`] is the bearer-token implementation
//! over `reqwest`; tests and embedders can supply their own.

mod http;

pub use http::HttpTransport;

use crate::error::{DecodeError, Result};

/// Body of a successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// The raw response body.
    body: String,
}

impl ApiResponse {
    /// Creates a new response with the given body.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parses the response as a specific type.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON cannot be parsed into the target type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> std::result::Result<T, DecodeError> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }
}

/// An authenticated client able to fetch service URIs.
///
/// Implementations attach whatever credential the service needs and report
/// failures through the crate [`Error`](crate::Error); no retries are
/// expected.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Issues a GET request for `uri` and returns the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`](crate::Error::Network) for transport or
    /// HTTP status failures, and [`Error::Auth`](crate::Error::Auth) if the
    /// credential cannot be renewed.
    async fn get(&self, uri: &str) -> Result<ApiResponse>;
}
