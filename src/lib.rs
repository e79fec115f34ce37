// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `SmartThings` Lib - A Rust client for `SmartThings` SmartApp device APIs.
//!
//! This library authenticates against a SmartApp installation, mirrors its
//! devices locally and sends commands to them, all through async APIs.
//!
//! # Supported Features
//!
//! - **Authorization**: OAuth 2.0 authorization-code flow through a local
//!   browser callback, with persisted and automatically refreshed tokens
//! - **Device catalog**: Every device with its label, attributes and
//!   supported commands, refreshed in one atomic step
//! - **Attributes**: Numeric view of every reported value (`"on"` and
//!   `"present"` read as `1.0`, other states as `0.0`)
//! - **Commands**: Validated against the device's command list before
//!   anything is sent
//!
//! # Quick Start
//!
//! ```no_run
//! use smartthings_lib::{Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> smartthings_lib::Result<()> {
//!     // The first run logs a login URL and waits for the browser callback;
//!     // later runs reuse the stored token.
//!     let session = Session::connect(SessionConfig::new("client-id", "client-secret")).await?;
//!
//!     for device in session.devices().iter() {
//!         println!("{} ({})", device.display_name(), device.id());
//!         for (name, value) in device.attributes() {
//!             println!("  {name} = {value}");
//!         }
//!     }
//!
//!     if let Some(lamp) = session.device("lamp-id") {
//!         if lamp.has_command("setLevel") {
//!             lamp.call("setLevel", &[75.0]).await?;
//!         }
//!         lamp.refresh().await?;
//!         println!("level is now {}", lamp.attribute("level"));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Credential Storage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use smartthings_lib::credential::MemoryCredentialStore;
//! use smartthings_lib::{Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> smartthings_lib::Result<()> {
//!     let session = Session::builder(SessionConfig::new("client-id", "client-secret"))
//!         .with_credential_store(Arc::new(MemoryCredentialStore::new()))
//!         .connect()
//!         .await?;
//!
//!     println!("{} devices", session.devices().len());
//!     Ok(())
//! }
//! ```

pub mod attribute;
pub mod auth;
pub mod command;
pub mod config;
pub mod credential;
mod device;
pub mod error;
pub mod protocol;
pub mod response;
mod session;
pub mod state;

pub use attribute::{AttributeMap, RawAttribute};
pub use auth::{AuthorizationCodeSource, LocalCallbackServer, OAuthClient};
pub use command::CommandSet;
pub use config::SessionConfig;
pub use credential::{
    Credential, CredentialKey, CredentialStore, FileCredentialStore, MemoryCredentialStore,
};
pub use device::Device;
pub use error::{AuthError, CommandError, DecodeError, Error, NetworkError, Result};
pub use protocol::{ApiResponse, HttpTransport, Transport};
pub use session::{Devices, Session, SessionBuilder};
pub use state::DeviceState;
