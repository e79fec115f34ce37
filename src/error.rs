// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the library.
//!
//! Failures fall into four groups: authorization (credential handling and
//! the OAuth handshake), network (anything the transport reports), decode
//! (malformed service payloads) and command (local validation that never
//! reaches the network).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Credential acquisition, refresh or persistence failed.
    #[error("authorization error: {0}")]
    Auth(#[from] AuthError),

    /// The transport failed to complete a request.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The service returned a payload that could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A command was rejected before being sent.
    #[error("command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors related to credentials and the authorization handshake.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential store could not be read or written.
    #[error("credential store failure for {key}: {message}")]
    Store {
        /// Key of the credential being accessed.
        key: String,
        /// Description of the failure.
        message: String,
    },

    /// The user (or the service) refused the authorization request.
    #[error("authorization denied: {0}")]
    Denied(String),

    /// The authorization code could not be obtained.
    #[error("failed to obtain authorization code: {0}")]
    CodeUnavailable(String),

    /// The callback carried a `state` value that does not match the request.
    #[error("authorization state mismatch")]
    StateMismatch,

    /// The token endpoint rejected a code exchange or refresh.
    #[error("token endpoint returned HTTP {status}: {body}")]
    TokenRejected {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the service.
        body: String,
    },

    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// The token endpoint answered with an unreadable body.
    #[error("invalid token response: {0}")]
    InvalidTokenResponse(#[source] serde_json::Error),

    /// The credential expired and carries no refresh token.
    #[error("credential expired and cannot be refreshed")]
    Expired,
}

/// Errors reported by the transport.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status} - {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// The service refused the bearer credential.
    #[error("request was not authorized")]
    Unauthorized,

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Local I/O failed while serving the authorization callback.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to decoding service payloads.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// Errors raised while validating a device command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The device does not advertise this command.
    #[error("unavailable command: {0}")]
    Unavailable(String),

    /// More than one argument was supplied.
    #[error("too many arguments: {0} given, at most 1 accepted")]
    TooManyArguments(usize),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
