// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authenticated session with a SmartApp installation.
//!
//! A [`Session`] owns the transport, the resolved installation endpoint and
//! the current device collection. It is created once with
//! [`Session::connect`] (or a [`SessionBuilder`]) and then refreshed as
//! often as needed.
//!
//! # Refresh Semantics
//!
//! [`Session::refresh`] rebuilds the whole collection: every device's
//! detail and command list is fetched before anything is replaced. If any
//! request fails the previous collection stays in place, so callers never
//! observe a partially refreshed catalog.
//!
//! ```no_run
//! use smartthings_lib::{Session, SessionConfig};
//!
//! # async fn example() -> smartthings_lib::Result<()> {
//! let session = Session::connect(SessionConfig::new("client-id", "secret")).await?;
//! println!("{} devices at {}", session.devices().len(), session.endpoint());
//!
//! session.refresh().await?;
//! # Ok(())
//! # }
//! ```

mod api;
mod builder;

pub use builder::SessionBuilder;

pub(crate) use api::{ApiContext, discover_endpoint};

use std::sync::Arc;

use parking_lot::RwLock;

use crate::command::CommandSet;
use crate::config::SessionConfig;
use crate::device::Device;
use crate::error::Result;
use crate::protocol::{HttpTransport, Transport};

/// Current device collection of a session.
pub type Devices<T = HttpTransport> = Arc<[Arc<Device<T>>]>;

/// Connection to a SmartApp installation and its devices.
#[derive(Debug)]
pub struct Session<T: Transport = HttpTransport> {
    api: Arc<ApiContext<T>>,
    devices: RwLock<Devices<T>>,
}

impl Session {
    /// Establishes a session with the default credential store and the
    /// local browser callback.
    ///
    /// See [`SessionBuilder::connect`] for the steps involved.
    ///
    /// # Errors
    ///
    /// Returns error if authorization, endpoint discovery or the initial
    /// refresh fails.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        SessionBuilder::new(config).connect().await
    }

    /// Creates a builder for a session with a custom credential store or
    /// code source.
    #[must_use]
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }
}

impl<T: Transport> Session<T> {
    /// Creates a session over `transport` for a known endpoint.
    ///
    /// The device collection starts empty; call [`refresh`](Self::refresh)
    /// to populate it.
    #[must_use]
    pub fn from_transport(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            api: Arc::new(ApiContext::new(transport, endpoint)),
            devices: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Returns the installation endpoint all device requests go to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.api.endpoint()
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        self.api.transport()
    }

    /// Returns the current device collection.
    ///
    /// The returned collection is not affected by later refreshes.
    #[must_use]
    pub fn devices(&self) -> Devices<T> {
        self.devices.read().clone()
    }

    /// Looks up a device by identifier.
    #[must_use]
    pub fn device(&self, id: &str) -> Option<Arc<Device<T>>> {
        self.devices.read().iter().find(|d| d.id() == id).cloned()
    }

    /// Rebuilds the device collection from the service.
    ///
    /// Devices are fetched one at a time. Only one refresh should run at a
    /// time; concurrent readers are always safe.
    ///
    /// # Errors
    ///
    /// Returns the first request or decoding error. The current collection
    /// is unchanged in that case.
    pub async fn refresh(&self) -> Result<()> {
        let summaries = self.api.devices().await?;
        let mut devices = Vec::with_capacity(summaries.len());

        for summary in &summaries {
            let detail = self.api.device_detail(&summary.id).await?;
            let descriptors = self.api.device_commands(&summary.id).await?;
            let commands = CommandSet::from_descriptors(&descriptors);

            tracing::debug!(
                device = %summary.id,
                attributes = detail.attributes.len(),
                commands = commands.len(),
                "Fetched device"
            );

            devices.push(Arc::new(Device::from_detail(
                Arc::clone(&self.api),
                detail,
                commands,
            )));
        }

        tracing::info!(devices = devices.len(), "Session refreshed");

        *self.devices.write() = Arc::from(devices);
        Ok(())
    }
}
