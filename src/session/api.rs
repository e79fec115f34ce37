// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed requests against the SmartApp device API.

use crate::error::{DecodeError, Result};
use crate::protocol::Transport;
use crate::response::{CommandDescriptor, DeviceDetail, DeviceSummary, EndpointRecord};

/// Transport bound to a resolved endpoint.
///
/// Shared by a session and all of its devices.
#[derive(Debug)]
pub(crate) struct ApiContext<T> {
    transport: T,
    endpoint: String,
}

impl<T: Transport> ApiContext<T> {
    pub(crate) fn new(transport: T, endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            transport,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn uri(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }

    /// Lists every device visible to the installation.
    pub(crate) async fn devices(&self) -> Result<Vec<DeviceSummary>> {
        let response = self.transport.get(&self.uri("/devices")).await?;
        Ok(response.parse()?)
    }

    /// Fetches one device with its current attributes.
    pub(crate) async fn device_detail(&self, id: &str) -> Result<DeviceDetail> {
        let path = format!("/devices/{}", urlencoding::encode(id));
        let response = self.transport.get(&self.uri(&path)).await?;
        Ok(response.parse()?)
    }

    /// Fetches the commands a device accepts.
    pub(crate) async fn device_commands(&self, id: &str) -> Result<Vec<CommandDescriptor>> {
        let path = format!("/devices/{}/commands", urlencoding::encode(id));
        let response = self.transport.get(&self.uri(&path)).await?;
        Ok(response.parse()?)
    }

    /// Issues a request whose body is of no interest.
    pub(crate) async fn send(&self, path: &str) -> Result<()> {
        self.transport.get(&self.uri(path)).await?;
        Ok(())
    }
}

/// Resolves the installation endpoint from the discovery listing at `url`.
///
/// The first record wins.
pub(crate) async fn discover_endpoint<T: Transport>(transport: &T, url: &str) -> Result<String> {
    let records: Vec<EndpointRecord> = transport.get(url).await?.parse()?;

    let endpoint = records
        .into_iter()
        .next()
        .map(|record| record.uri)
        .ok_or_else(|| DecodeError::UnexpectedFormat("endpoint list is empty".to_string()))?;

    tracing::debug!(endpoint = %endpoint, "Resolved endpoint");
    Ok(endpoint)
}
