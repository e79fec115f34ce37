// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use chrono::{DateTime, Utc};

use crate::attribute::AttributeMap;

/// Attribute snapshot of a device.
///
/// A state is either uninitialized (never refreshed, no attributes) or
/// populated by a refresh. There is no way back from populated to
/// uninitialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    /// Normalized attribute values.
    attributes: AttributeMap,
    /// When the attributes were fetched; `None` until the first refresh.
    refreshed_at: Option<DateTime<Utc>>,
}

impl DeviceState {
    /// Creates an uninitialized state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state populated with `attributes`, stamped with the current time.
    #[must_use]
    pub fn populated(attributes: AttributeMap) -> Self {
        Self::populated_at(attributes, Utc::now())
    }

    /// Creates a state populated with `attributes` at a given time.
    #[must_use]
    pub fn populated_at(attributes: AttributeMap, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            attributes,
            refreshed_at: Some(refreshed_at),
        }
    }

    /// Returns the attribute values.
    #[must_use]
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Returns one attribute value, if known.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }

    /// Returns `true` once a refresh has succeeded.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.refreshed_at.is_some()
    }

    /// Returns the time of the last successful refresh.
    #[must_use]
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}
