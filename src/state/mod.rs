// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state snapshots.
//!
//! A [`DeviceState`] is the set of normalized attributes observed by one
//! refresh, together with the time of that refresh. Devices replace the
//! whole snapshot at once, so readers never see a mix of two refreshes.
//!
//! # Examples
//!
//! ```
//! use smartthings_lib::attribute::AttributeMap;
//! use smartthings_lib::state::DeviceState;
//!
//! let state = DeviceState::new();
//! assert!(!state.is_populated());
//!
//! let mut attributes = AttributeMap::new();
//! attributes.insert("level".to_string(), 42.0);
//! let state = DeviceState::populated(attributes);
//!
//! assert!(state.is_populated());
//! assert_eq!(state.attribute("level"), Some(42.0));
//! ```

mod device_state;

pub use device_state::DeviceState;
