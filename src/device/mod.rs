// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Devices exposed by a session.
//!
//! A [`Device`] caches the attributes observed by its last refresh and the
//! commands the service says it accepts. Reads are served from the cache;
//! only [`Device::refresh`] and [`Device::call`] go to the network.
//!
//! # Thread Safety
//!
//! Devices are shared as `Arc<Device>`. The attribute snapshot sits behind a
//! read-write lock: any number of readers copy it out while a refresh
//! replaces it in one step, so a reader sees either the previous or the
//! next snapshot, never a mix. The lock is only taken after the network
//! round trip has completed.
//!
//! ```no_run
//! use smartthings_lib::{Session, SessionConfig};
//!
//! # async fn example() -> smartthings_lib::Result<()> {
//! let session = Session::connect(SessionConfig::new("client-id", "secret")).await?;
//!
//! for device in session.devices().iter() {
//!     println!("{}: switch = {}", device.display_name(), device.attribute("switch"));
//! }
//!
//! if let Some(lamp) = session.device("lamp-id") {
//!     lamp.call("setLevel", &[40.0]).await?;
//!     lamp.refresh().await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::attribute::{AttributeMap, normalize_attributes};
use crate::command::{CommandSet, command_path};
use crate::error::Result;
use crate::protocol::{HttpTransport, Transport};
use crate::response::DeviceDetail;
use crate::session::ApiContext;
use crate::state::DeviceState;

/// A device registered with the SmartApp installation.
///
/// # Type Parameter
///
/// `T` is the transport shared with the owning session, [`HttpTransport`]
/// unless the session was built with
/// [`Session::from_transport`](crate::Session::from_transport).
#[derive(Debug)]
pub struct Device<T: Transport = HttpTransport> {
    api: Arc<ApiContext<T>>,
    id: String,
    name: String,
    display_name: String,
    commands: CommandSet,
    state: RwLock<DeviceState>,
}

impl<T: Transport> Device<T> {
    /// Creates a populated device from a freshly fetched detail record.
    pub(crate) fn from_detail(
        api: Arc<ApiContext<T>>,
        detail: DeviceDetail,
        commands: CommandSet,
    ) -> Self {
        let attributes = normalize_attributes(&detail.attributes);
        Self {
            api,
            id: detail.summary.id,
            name: detail.summary.name,
            display_name: detail.summary.display_name,
            commands,
            state: RwLock::new(DeviceState::populated(attributes)),
        }
    }

    /// Returns the service-assigned identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the commands the device accepts.
    #[must_use]
    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// Returns `true` if the device accepts `name`.
    #[must_use]
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains(name)
    }

    /// Returns a copy of the cached attributes.
    ///
    /// Later refreshes do not affect the returned map.
    #[must_use]
    pub fn attributes(&self) -> AttributeMap {
        self.state.read().attributes().clone()
    }

    /// Returns one cached attribute, or `0.0` if the device did not report it.
    #[must_use]
    pub fn attribute(&self, name: &str) -> f64 {
        self.state.read().attribute(name).unwrap_or(0.0)
    }

    /// Returns a copy of the full cached state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state.read().clone()
    }

    /// Returns `true` once attributes have been fetched.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.state.read().is_populated()
    }

    /// Returns when the cached attributes were fetched.
    #[must_use]
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.state.read().refreshed_at()
    }

    /// Fetches the device's current attributes and replaces the cache.
    ///
    /// The command set is left as is; it only changes with a session
    /// refresh.
    ///
    /// # Errors
    ///
    /// Returns error if the request or decoding fails. The cached
    /// attributes are unchanged in that case.
    pub async fn refresh(&self) -> Result<()> {
        let detail = self.api.device_detail(&self.id).await?;
        let next = DeviceState::populated(normalize_attributes(&detail.attributes));

        tracing::debug!(
            device = %self.id,
            attributes = next.attributes().len(),
            "Device refreshed"
        );

        *self.state.write() = next;
        Ok(())
    }

    /// Sends a command with at most one numeric argument.
    ///
    /// The response body is discarded and the cached attributes are not
    /// touched; call [`refresh`](Self::refresh) to observe the effect.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`](crate::CommandError) without any network
    /// traffic if the command is unknown or too many arguments are given,
    /// otherwise any transport error.
    pub async fn call(&self, command: &str, args: &[f64]) -> Result<()> {
        let path = command_path(&self.id, &self.commands, command, args)?;

        tracing::debug!(device = %self.id, command = %command, ?args, "Sending command");

        self.api.send(&path).await
    }
}
