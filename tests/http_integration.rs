// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for sessions and devices using wiremock.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use parking_lot::Mutex;
use smartthings_lib::{
    AuthError, AuthorizationCodeSource, CommandError, Credential, CredentialKey, CredentialStore,
    DecodeError, Error, MemoryCredentialStore, NetworkError, Session, SessionConfig,
};
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INSTALLATION: &str = "/api/smartapps/installations/inst-1";

// ============================================================================
// Helpers
// ============================================================================

/// Code source answering with a fixed result and recording what it was asked.
#[derive(Default)]
struct ScriptedCodeSource {
    denied: bool,
    seen: Mutex<Option<(String, String)>>,
}

impl AuthorizationCodeSource for ScriptedCodeSource {
    async fn authorization_code(&self, authorize_url: &str, state: &str) -> smartthings_lib::Result<String> {
        *self.seen.lock() = Some((authorize_url.to_string(), state.to_string()));
        if self.denied {
            return Err(AuthError::Denied("access_denied".to_string()).into());
        }
        Ok("the-code".to_string())
    }
}

fn config(server: &MockServer) -> SessionConfig {
    SessionConfig::new("abc", "s3cret").with_api_base(server.uri())
}

fn key() -> CredentialKey {
    CredentialKey::for_client("abc")
}

fn store_with(credential: Credential) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_credential(key(), credential))
}

fn valid_credential() -> Credential {
    Credential::new("tok").with_expiry(Utc::now() + TimeDelta::hours(1))
}

fn json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

async fn mount_endpoints(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/smartapps/endpoints"))
        .respond_with(json(serde_json::json!([{
            "uri": format!("{}{INSTALLATION}", server.uri()),
            "base_url": server.uri(),
            "url": INSTALLATION,
        }])))
        .mount(server)
        .await;
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{INSTALLATION}/devices")))
        .respond_with(json(serde_json::json!([
            {"id": "d1", "name": "Lamp", "displayName": "Desk Lamp"},
            {"id": "d2", "name": "Presence", "displayName": "Phone"},
        ])))
        .mount(server)
        .await;
    mount_detail(server, "d1", serde_json::json!({"switch": "on", "level": 42, "flag": true})).await;
    mount_detail(server, "d2", serde_json::json!({"presence": "not present"})).await;
    Mock::given(method("GET"))
        .and(path(format!("{INSTALLATION}/devices/d1/commands")))
        .respond_with(json(serde_json::json!([
            {"command": "on", "params": {}},
            {"command": "off", "params": {}},
            {"command": "setLevel", "params": {"level": {"type": "number"}}},
            {"command": "on", "params": {}},
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{INSTALLATION}/devices/d2/commands")))
        .respond_with(json(serde_json::json!([])))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, attributes: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{INSTALLATION}/devices/{id}")))
        .respond_with(json(serde_json::json!({
            "id": id,
            "name": id,
            "displayName": id,
            "attributes": attributes,
        })))
        .mount(server)
        .await;
}

async fn connected_session(server: &MockServer) -> Session {
    mount_endpoints(server).await;
    mount_catalog(server).await;
    Session::builder(config(server))
        .with_credential_store(store_with(valid_credential()))
        .with_code_source(ScriptedCodeSource {
            denied: true,
            ..Default::default()
        })
        .connect()
        .await
        .unwrap()
}

// ============================================================================
// Session Establishment
// ============================================================================

mod connect {
    use super::*;

    #[tokio::test]
    async fn stored_credential_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices")))
            .and(header("authorization", "Bearer tok"))
            .respond_with(json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;
        mount_endpoints(&server).await;

        let code_source = ScriptedCodeSource::default();
        let session = Session::builder(config(&server))
            .with_credential_store(store_with(valid_credential()))
            .with_code_source(code_source)
            .connect()
            .await
            .unwrap();

        assert_eq!(session.endpoint(), format!("{}{INSTALLATION}", server.uri()));
        assert!(session.devices().is_empty());
    }

    #[tokio::test]
    async fn connect_loads_full_catalog() {
        let server = MockServer::start().await;
        let session = connected_session(&server).await;

        let devices = session.devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id(), "d1");
        assert_eq!(devices[1].id(), "d2");

        let lamp = session.device("d1").unwrap();
        assert!(lamp.is_populated());
        assert_eq!(lamp.attributes().len(), 2);
        assert_eq!(lamp.attribute("switch"), 1.0);
        assert_eq!(lamp.attribute("level"), 42.0);
        assert!(!lamp.attributes().contains_key("flag"));
        assert_eq!(lamp.commands().names(), ["on", "off", "setLevel"]);

        let phone = session.device("d2").unwrap();
        assert_eq!(phone.attribute("presence"), 0.0);
    }

    #[tokio::test]
    async fn expired_credential_is_refreshed_without_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=r1"))
            .respond_with(json(serde_json::json!({
                "access_token": "fresh",
                "token_type": "bearer",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices")))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(json(serde_json::json!([])))
            .mount(&server)
            .await;
        mount_endpoints(&server).await;

        let expired = Credential::new("stale")
            .with_refresh_token("r1")
            .with_expiry(Utc::now() - TimeDelta::minutes(5));
        let store = store_with(expired);
        let code_source = ScriptedCodeSource::default();

        let session = Session::builder(config(&server))
            .with_credential_store(store.clone())
            .with_code_source(code_source)
            .connect()
            .await
            .unwrap();

        assert!(session.devices().is_empty());
        let saved = store.load(&key()).unwrap().unwrap();
        assert_eq!(saved.access_token, "fresh");
        assert_eq!(saved.refresh_token.as_deref(), Some("r1"));
        assert!(saved.is_valid());
    }

    #[tokio::test]
    async fn missing_credential_runs_authorization_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("client_id=abc"))
            .respond_with(json(serde_json::json!({
                "access_token": "granted",
                "token_type": "bearer",
                "refresh_token": "r9",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices")))
            .and(header("authorization", "Bearer granted"))
            .respond_with(json(serde_json::json!([])))
            .mount(&server)
            .await;
        mount_endpoints(&server).await;

        let store = Arc::new(MemoryCredentialStore::new());
        let code_source = Arc::new(ScriptedCodeSource::default());

        Session::builder(config(&server))
            .with_credential_store(store.clone())
            .with_code_source(SharedSource(code_source.clone()))
            .connect()
            .await
            .unwrap();

        let saved = store.load(&key()).unwrap().unwrap();
        assert_eq!(saved.access_token, "granted");
        assert_eq!(saved.refresh_token.as_deref(), Some("r9"));

        let (authorize_url, state) = code_source.seen.lock().clone().unwrap();
        assert!(authorize_url.starts_with(&format!("{}/oauth/authorize?", server.uri())));
        assert!(authorize_url.contains("response_type=code"));
        assert!(authorize_url.contains("client_id=abc"));
        assert!(authorize_url.contains(&format!("state={state}")));
        assert!(!state.is_empty());
    }

    #[tokio::test]
    async fn denied_authorization_fails_and_saves_nothing() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryCredentialStore::new());

        let err = Session::builder(config(&server))
            .with_credential_store(store.clone())
            .with_code_source(ScriptedCodeSource {
                denied: true,
                ..Default::default()
            })
            .connect()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::Denied(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn rejected_code_exchange_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .mount(&server)
            .await;

        let err = Session::builder(config(&server))
            .with_credential_store(Arc::new(MemoryCredentialStore::new()))
            .with_code_source(ScriptedCodeSource::default())
            .connect()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Auth(AuthError::TokenRejected { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn empty_endpoint_list_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/smartapps/endpoints"))
            .respond_with(json(serde_json::json!([])))
            .mount(&server)
            .await;

        let err = Session::builder(config(&server))
            .with_credential_store(store_with(valid_credential()))
            .with_code_source(ScriptedCodeSource::default())
            .connect()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode(DecodeError::UnexpectedFormat(_))));
    }

    #[tokio::test]
    async fn failing_initial_refresh_fails_connect() {
        let server = MockServer::start().await;
        mount_endpoints(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = Session::builder(config(&server))
            .with_credential_store(store_with(valid_credential()))
            .with_code_source(ScriptedCodeSource::default())
            .connect()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Network(NetworkError::Status { status: 500, .. })
        ));
    }

    /// Lets a test keep a handle on the code source it hands to the builder.
    struct SharedSource(Arc<ScriptedCodeSource>);

    impl AuthorizationCodeSource for SharedSource {
        async fn authorization_code(
            &self,
            authorize_url: &str,
            state: &str,
        ) -> smartthings_lib::Result<String> {
            self.0.authorization_code(authorize_url, state).await
        }
    }
}

// ============================================================================
// Session Refresh
// ============================================================================

mod refresh {
    use super::*;

    #[tokio::test]
    async fn failing_device_keeps_previous_collection() {
        let server = MockServer::start().await;
        let session = connected_session(&server).await;
        let before = session.devices();

        server.reset().await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices")))
            .respond_with(json(serde_json::json!([
                {"id": "d1", "name": "Lamp", "displayName": "Desk Lamp"},
                {"id": "d2", "name": "Presence", "displayName": "Phone"},
                {"id": "d3", "name": "New", "displayName": "New"},
            ])))
            .mount(&server)
            .await;
        mount_detail(&server, "d1", serde_json::json!({"switch": "off"})).await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices/d1/commands")))
            .respond_with(json(serde_json::json!([{"command": "on"}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices/d2")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = session.refresh().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Network(NetworkError::Status { status: 500, .. })
        ));
        let after = session.devices();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.len(), 2);
        assert_eq!(session.device("d1").unwrap().attribute("switch"), 1.0);
        assert!(session.device("d3").is_none());
    }

    #[tokio::test]
    async fn refresh_picks_up_changes() {
        let server = MockServer::start().await;
        let session = connected_session(&server).await;

        server.reset().await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices")))
            .respond_with(json(serde_json::json!([
                {"id": "d1", "name": "Lamp", "displayName": "Desk Lamp"},
            ])))
            .mount(&server)
            .await;
        mount_detail(&server, "d1", serde_json::json!({"switch": "off", "level": 10})).await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices/d1/commands")))
            .respond_with(json(serde_json::json!([{"command": "on"}, {"command": "off"}])))
            .mount(&server)
            .await;

        session.refresh().await.unwrap();

        assert_eq!(session.devices().len(), 1);
        let lamp = session.device("d1").unwrap();
        assert_eq!(lamp.attribute("switch"), 0.0);
        assert_eq!(lamp.attribute("level"), 10.0);
        assert!(!lamp.has_command("setLevel"));
    }
}

// ============================================================================
// Device Operations
// ============================================================================

mod device {
    use super::*;

    #[tokio::test]
    async fn call_without_argument() {
        let server = MockServer::start().await;
        let session = connected_session(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices/d1/off")))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ignored"))
            .expect(1)
            .mount(&server)
            .await;

        let lamp = session.device("d1").unwrap();
        lamp.call("off", &[]).await.unwrap();

        assert_eq!(lamp.attribute("switch"), 1.0);
    }

    #[tokio::test]
    async fn call_with_argument() {
        let server = MockServer::start().await;
        let session = connected_session(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices/d1/setLevel/50")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices/d1/setLevel/12.5")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let lamp = session.device("d1").unwrap();
        lamp.call("setLevel", &[50.0]).await.unwrap();
        lamp.call("setLevel", &[12.5]).await.unwrap();
    }

    #[tokio::test]
    async fn invalid_calls_never_reach_the_service() {
        let server = MockServer::start().await;
        let session = connected_session(&server).await;
        Mock::given(method("GET"))
            .and(path_regex(r"/devices/d[12]/(lock|setLevel|on)"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let lamp = session.device("d1").unwrap();
        let phone = session.device("d2").unwrap();

        for args in [&[][..], &[1.0][..], &[1.0, 2.0][..]] {
            let err = lamp.call("lock", args).await.unwrap_err();
            assert!(matches!(err, Error::Command(CommandError::Unavailable(ref c)) if c == "lock"));
            let err = phone.call("on", args).await.unwrap_err();
            assert!(matches!(err, Error::Command(CommandError::Unavailable(_))));
        }

        let err = lamp.call("setLevel", &[1.0, 2.0]).await.unwrap_err();
        assert!(matches!(err, Error::Command(CommandError::TooManyArguments(2))));
        assert_eq!(
            err.to_string(),
            "command error: too many arguments: 2 given, at most 1 accepted"
        );
    }

    #[tokio::test]
    async fn command_failure_is_reported() {
        let server = MockServer::start().await;
        let session = connected_session(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices/d1/on")))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = session.device("d1").unwrap().call("on", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Network(NetworkError::Unauthorized)));
    }

    #[tokio::test]
    async fn refresh_updates_attributes_only() {
        let server = MockServer::start().await;
        let session = connected_session(&server).await;
        let lamp = session.device("d1").unwrap();
        let snapshot = lamp.attributes();
        let first_refresh = lamp.last_refreshed().unwrap();

        server.reset().await;
        mount_detail(&server, "d1", serde_json::json!({"switch": "off", "level": 99.5})).await;

        lamp.refresh().await.unwrap();

        assert_eq!(lamp.attribute("switch"), 0.0);
        assert_eq!(lamp.attribute("level"), 99.5);
        assert!(lamp.last_refreshed().unwrap() >= first_refresh);
        assert_eq!(lamp.commands().names(), ["on", "off", "setLevel"]);
        assert_eq!(snapshot["switch"], 1.0);
        assert_eq!(snapshot["level"], 42.0);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_known_good() {
        let server = MockServer::start().await;
        let session = connected_session(&server).await;
        let lamp = session.device("d1").unwrap();
        let before = lamp.state();

        server.reset().await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTALLATION}/devices/d1")))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = lamp.refresh().await.unwrap_err();

        assert!(matches!(err, Error::Decode(DecodeError::Json(_))));
        assert_eq!(lamp.state(), before);
    }
}
