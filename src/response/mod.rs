// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire records returned by the SmartApp REST API.
//!
//! These types only live for the duration of a refresh: they are decoded
//! from the service's JSON, turned into [`Device`](crate::Device) state, and
//! dropped.

use std::collections::HashMap;

use serde::Deserialize;

use crate::attribute::RawAttribute;

/// Entry of the `/devices` listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceSummary {
    /// Service-assigned identifier.
    pub id: String,
    /// Device name.
    #[serde(default)]
    pub name: String,
    /// Human label.
    #[serde(rename = "displayName", default)]
    pub display_name: String,
}

/// Body of `/devices/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceDetail {
    /// Identity and labels.
    #[serde(flatten)]
    pub summary: DeviceSummary,
    /// Current attribute values, as reported.
    ///
    /// A number outside the `f64` range fails the whole record.
    #[serde(default)]
    pub attributes: HashMap<String, RawAttribute>,
}

/// Entry of `/devices/{id}/commands`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandDescriptor {
    /// Command name.
    pub command: String,
    /// Parameter description. Not interpreted by this library.
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

/// Entry of the SmartApp endpoint discovery listing.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointRecord {
    /// Base URI for all device requests.
    pub uri: String,
    /// Base URL of the installation, when reported.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Endpoint path, when reported.
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_list() {
        let json = r#"[
            {"id": "d1", "name": "Lamp", "displayName": "Living Room Lamp"},
            {"id": "d2", "name": "Sensor", "displayName": "Front Door"}
        ]"#;
        let summaries: Vec<DeviceSummary> = serde_json::from_str(json).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, "d1");
        assert_eq!(summaries[1].display_name, "Front Door");
    }

    #[test]
    fn detail_with_attributes() {
        let json = r#"{
            "id": "d1",
            "name": "Lamp",
            "displayName": "Living Room Lamp",
            "attributes": {"switch": "on", "level": 42, "flag": true}
        }"#;
        let detail: DeviceDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.summary.id, "d1");
        assert_eq!(detail.attributes.len(), 3);
        assert_eq!(detail.attributes["level"], RawAttribute::Number(42.0));
        assert_eq!(detail.attributes["switch"], RawAttribute::Text("on".to_string()));
    }

    #[test]
    fn detail_without_attributes() {
        let detail: DeviceDetail =
            serde_json::from_str(r#"{"id": "d1", "name": "Lamp", "displayName": "Lamp"}"#)
                .unwrap();
        assert!(detail.attributes.is_empty());
    }

    #[test]
    fn command_descriptors() {
        let json = r#"[
            {"command": "on", "params": {}},
            {"command": "setLevel", "params": {"level": {"type": "number"}}},
            {"command": "off"}
        ]"#;
        let commands: Vec<CommandDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(commands[1].command, "setLevel");
        assert!(commands[1].params.contains_key("level"));
        assert!(commands[2].params.is_empty());
    }

    #[test]
    fn endpoint_records() {
        let json = r#"[{
            "oauthClient": {"clientId": "abc"},
            "uri": "https://graph.api.smartthings.com/api/smartapps/installations/42",
            "base_url": "https://graph.api.smartthings.com",
            "url": "/api/smartapps/installations/42"
        }]"#;
        let endpoints: Vec<EndpointRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(
            endpoints[0].uri,
            "https://graph.api.smartthings.com/api/smartapps/installations/42"
        );
        assert_eq!(endpoints[0].url.as_deref(), Some("/api/smartapps/installations/42"));
    }

    #[test]
    fn out_of_range_number_fails_the_record() {
        let json = r#"{"id": "d1", "name": "Meter", "displayName": "Meter",
                       "attributes": {"switch": "on", "energy": 1e400}}"#;
        let err = serde_json::from_str::<DeviceDetail>(json).unwrap_err();
        assert!(err.to_string().contains("number out of range"), "{err}");
    }
}
