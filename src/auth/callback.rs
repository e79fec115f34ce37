// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interactive acquisition of the OAuth authorization code.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Url;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use warp::Filter;
use warp::http::Uri;
use warp::path::FullPath;
use warp::reply::{Reply, Response};

use crate::error::{AuthError, Error, NetworkError};

/// Source of an OAuth authorization code.
///
/// Implementations present `authorize_url` to the user in some way and
/// return the code the service hands back, after checking that the echoed
/// `state` matches.
#[allow(async_fn_in_trait)]
pub trait AuthorizationCodeSource {
    /// Obtains an authorization code.
    ///
    /// # Errors
    ///
    /// Returns error if the user denies access or the code cannot be received.
    async fn authorization_code(&self, authorize_url: &str, state: &str) -> Result<String, Error>;
}

/// Receives the authorization code on a local HTTP listener.
///
/// The listener address and callback path come from the OAuth redirect URL,
/// for example `http://localhost:4567/OAuthCallback`. The user opens the
/// listener's root in a browser, is redirected to the service's login page,
/// and the service redirects back to the callback path with the code. Only
/// one code is accepted per call.
///
/// The login address is logged at info level. Applications that want to
/// show it themselves install a prompt with [`with_prompt`](Self::with_prompt).
///
/// # Examples
///
/// ```
/// use smartthings_lib::auth::LocalCallbackServer;
///
/// let server = LocalCallbackServer::new("http://localhost:4567/OAuthCallback")
///     .with_prompt(|url| println!("Please log in by visiting {url}"));
/// assert_eq!(server.bind_addr().unwrap().port(), 4567);
/// assert_eq!(server.callback_path().unwrap(), "/OAuthCallback");
/// ```
#[derive(Clone)]
pub struct LocalCallbackServer {
    redirect_url: String,
    prompt: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

/// What a single browser request meant for the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CallbackOutcome {
    /// Any path other than the callback: send the browser to the login page.
    Redirect,
    /// The callback carried a valid code.
    Code(String),
    /// The callback reported an error.
    Denied(String),
    /// The callback carried the wrong `state`.
    StateMismatch,
    /// The callback carried neither a code nor an error.
    MissingCode,
}

impl LocalCallbackServer {
    /// Creates a server for an OAuth redirect URL.
    ///
    /// The URL is only validated when the server is used.
    #[must_use]
    pub fn new(redirect_url: impl Into<String>) -> Self {
        Self {
            redirect_url: redirect_url.into(),
            prompt: None,
        }
    }

    /// Sets a callback that receives the login address once the listener is up.
    #[must_use]
    pub fn with_prompt<F>(mut self, prompt: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.prompt = Some(Arc::new(prompt));
        self
    }

    /// Returns the redirect URL this server answers.
    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    fn parse_redirect(&self) -> Result<Url, NetworkError> {
        let url = Url::parse(&self.redirect_url)
            .map_err(|e| NetworkError::InvalidAddress(format!("{}: {e}", self.redirect_url)))?;

        if url.scheme() != "http" {
            return Err(NetworkError::InvalidAddress(format!(
                "{}: callback must use http",
                self.redirect_url
            )));
        }
        Ok(url)
    }

    /// Returns the address the listener binds to.
    ///
    /// `localhost` binds to the IPv4 loopback address.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidAddress`] if the redirect URL is not a
    /// plain `http` URL with `localhost` or an IP address as host.
    pub fn bind_addr(&self) -> Result<SocketAddr, NetworkError> {
        let url = self.parse_redirect()?;

        let host = match url.host_str() {
            Some("localhost") | None => "127.0.0.1",
            Some(host) => host.trim_start_matches('[').trim_end_matches(']'),
        };
        let ip = host.parse().map_err(|_| {
            NetworkError::InvalidAddress(format!("{}: unsupported host", self.redirect_url))
        })?;
        let port = url.port_or_known_default().unwrap_or(80);

        Ok(SocketAddr::new(ip, port))
    }

    /// Returns the path the service redirects back to.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidAddress`] if the redirect URL is invalid.
    pub fn callback_path(&self) -> Result<String, NetworkError> {
        Ok(self.parse_redirect()?.path().to_string())
    }

    /// Starts the listener and returns once it accepts connections.
    ///
    /// The listener answers every path except the callback with a redirect
    /// to `authorize_url`, and stops after the first callback.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidAddress`] if the redirect or authorize
    /// URL is invalid, or [`NetworkError::Io`] if the address cannot be bound.
    pub async fn listen(&self, authorize_url: &str, state: &str) -> Result<PendingCallback, Error> {
        self.listen_on(self.bind_addr()?, authorize_url, state).await
    }

    /// Same as [`listen`](Self::listen) on an explicit address.
    ///
    /// # Errors
    ///
    /// See [`listen`](Self::listen).
    pub async fn listen_on(
        &self,
        addr: SocketAddr,
        authorize_url: &str,
        state: &str,
    ) -> Result<PendingCallback, Error> {
        let callback_path: Arc<str> = self.callback_path()?.into();
        let login: Uri = authorize_url
            .parse()
            .map_err(|e| NetworkError::InvalidAddress(format!("{authorize_url}: {e}")))?;
        let expected_state: Arc<str> = state.into();

        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let routes = warp::get()
            .and(warp::path::full())
            .and(warp::query::<HashMap<String, String>>())
            .map(move |path: FullPath, query: HashMap<String, String>| {
                let outcome = classify(path.as_str(), &query, &callback_path, &expected_state);
                respond(&outcome, &login, &outcome_tx)
            });

        let (local, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|e| NetworkError::Io(std::io::Error::other(e)))?;
        let task = tokio::spawn(server);

        tracing::info!(address = %local, "Waiting for authorization callback");
        if let Some(prompt) = &self.prompt {
            prompt(&format!("http://{local}/"));
        }

        Ok(PendingCallback {
            local,
            outcomes: outcome_rx,
            shutdown: Some(shutdown_tx),
            task,
        })
    }
}

impl fmt::Debug for LocalCallbackServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCallbackServer")
            .field("redirect_url", &self.redirect_url)
            .field("prompt", &self.prompt.is_some())
            .finish()
    }
}

/// A running callback listener waiting for the browser.
#[derive(Debug)]
pub struct PendingCallback {
    local: SocketAddr,
    outcomes: mpsc::UnboundedReceiver<CallbackOutcome>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PendingCallback {
    /// Returns the address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Waits for the callback and shuts the listener down.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Denied`] if the user refused access,
    /// [`AuthError::StateMismatch`] if the callback carried another `state`,
    /// or [`AuthError::CodeUnavailable`] if it carried no code or the
    /// listener stopped.
    pub async fn code(mut self) -> Result<String, Error> {
        let outcome = self.outcomes.recv().await;

        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Authorization callback listener failed");
        }

        match outcome {
            Some(CallbackOutcome::Code(code)) => Ok(code),
            Some(CallbackOutcome::Denied(reason)) => Err(AuthError::Denied(reason).into()),
            Some(CallbackOutcome::StateMismatch) => Err(AuthError::StateMismatch.into()),
            Some(CallbackOutcome::MissingCode) => Err(AuthError::CodeUnavailable(
                "callback carried no code".to_string(),
            )
            .into()),
            Some(CallbackOutcome::Redirect) | None => Err(AuthError::CodeUnavailable(
                "callback listener stopped".to_string(),
            )
            .into()),
        }
    }
}

/// Interprets a request received by the callback listener.
fn classify(
    path: &str,
    query: &HashMap<String, String>,
    callback_path: &str,
    expected_state: &str,
) -> CallbackOutcome {
    if path != callback_path {
        return CallbackOutcome::Redirect;
    }
    if let Some(error) = query.get("error") {
        return CallbackOutcome::Denied(error.clone());
    }
    if query.get("state").map(String::as_str) != Some(expected_state) {
        return CallbackOutcome::StateMismatch;
    }
    match query.get("code") {
        Some(code) if !code.is_empty() => CallbackOutcome::Code(code.clone()),
        _ => CallbackOutcome::MissingCode,
    }
}

/// Builds the browser reply and hands a final outcome to the waiting flow.
fn respond(
    outcome: &CallbackOutcome,
    login: &Uri,
    outcomes: &mpsc::UnboundedSender<CallbackOutcome>,
) -> Response {
    if *outcome == CallbackOutcome::Redirect {
        return warp::redirect::found(login.clone()).into_response();
    }

    // The receiver is gone once a first outcome was taken.
    let _ = outcomes.send(outcome.clone());

    let message = if matches!(outcome, CallbackOutcome::Code(_)) {
        "Authorization complete. You may close this window."
    } else {
        "Authorization failed. Check the application log."
    };
    warp::reply::html(format!("<html><body><p>{message}</p></body></html>")).into_response()
}

impl AuthorizationCodeSource for LocalCallbackServer {
    async fn authorization_code(&self, authorize_url: &str, state: &str) -> Result<String, Error> {
        self.listen(authorize_url, state).await?.code().await
    }
}
