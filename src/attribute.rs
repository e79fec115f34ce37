// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalization of reported attribute values.
//!
//! The service reports attribute values as arbitrary JSON scalars: numbers
//! for readings like `level` or `temperature`, strings for binary states
//! like `switch` or `presence`, and occasionally something else. Devices
//! expose every attribute as an `f64`, using these rules:
//!
//! | Raw value | Normalized |
//! |-----------|-----------|
//! | number | unchanged |
//! | `"on"`, `"present"` | `1.0` |
//! | any other string | `0.0` |
//! | anything else | dropped |
//!
//! # Examples
//!
//! ```
//! use smartthings_lib::attribute::{normalize, RawAttribute};
//!
//! assert_eq!(normalize(&RawAttribute::Number(21.5)), Some(21.5));
//! assert_eq!(normalize(&RawAttribute::Text("on".into())), Some(1.0));
//! assert_eq!(normalize(&RawAttribute::Text("off".into())), Some(0.0));
//! assert_eq!(normalize(&RawAttribute::Other(serde_json::Value::Bool(true))), None);
//! ```

use std::collections::HashMap;

use serde::Deserialize;

/// Normalized attribute values, keyed by attribute name.
pub type AttributeMap = HashMap<String, f64>;

/// String values that normalize to `1.0`.
const ACTIVE_STATES: [&str; 2] = ["on", "present"];

/// A raw attribute value as decoded from the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAttribute {
    /// A JSON number.
    Number(f64),
    /// A JSON string.
    Text(String),
    /// Any other JSON value (boolean, null, array, object).
    Other(serde_json::Value),
}

/// Maps a raw value to its numeric form, or `None` if it has no numeric form.
#[must_use]
pub fn normalize(raw: &RawAttribute) -> Option<f64> {
    match raw {
        RawAttribute::Number(n) => Some(*n),
        RawAttribute::Text(s) if ACTIVE_STATES.contains(&s.as_str()) => Some(1.0),
        RawAttribute::Text(_) => Some(0.0),
        RawAttribute::Other(_) => None,
    }
}

/// Normalizes a full attribute set.
///
/// Values without a numeric form are logged and left out of the result.
#[must_use]
pub fn normalize_attributes<'a, I>(raw: I) -> AttributeMap
where
    I: IntoIterator<Item = (&'a String, &'a RawAttribute)>,
{
    raw.into_iter()
        .filter_map(|(name, value)| match normalize(value) {
            Some(n) => Some((name.clone(), n)),
            None => {
                tracing::warn!(attribute = %name, value = ?value, "Unhandled attribute type");
                None
            }
        })
        .collect()
}
