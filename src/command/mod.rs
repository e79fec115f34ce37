// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device commands.
//!
//! A device advertises the commands it accepts (`on`, `off`, `setLevel`,
//! ...). The [`CommandSet`] keeps those names in the order the service
//! listed them, without duplicates. [`command_path`] checks a requested
//! command against that set and renders the request path.
//!
//! # Command Structure
//!
//! A command request is `/devices/{id}/{command}`, optionally followed by a
//! single numeric argument as one more path segment:
//!
//! ```
//! use smartthings_lib::command::{command_path, CommandSet};
//!
//! let commands = CommandSet::from_names(["on", "off", "setLevel"]);
//!
//! assert_eq!(command_path("d1", &commands, "on", &[]).unwrap(), "/devices/d1/on");
//! assert_eq!(
//!     command_path("d1", &commands, "setLevel", &[50.0]).unwrap(),
//!     "/devices/d1/setLevel/50"
//! );
//! assert!(command_path("d1", &commands, "lock", &[]).is_err());
//! ```
//!
//! # Argument Rendering
//!
//! Arguments use the shortest decimal form that reads back as the same
//! `f64`: `50.0` renders as `50`, `0.5` as `0.5`, never with an exponent.

use std::collections::HashSet;

use crate::error::CommandError;
use crate::response::CommandDescriptor;

/// Maximum number of arguments a command accepts.
pub const MAX_ARGUMENTS: usize = 1;

/// Ordered set of distinct command names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSet {
    names: Vec<String>,
}

impl CommandSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from names, keeping the first occurrence of each.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| seen.insert(name.clone()))
            .collect();
        Self { names }
    }

    /// Builds a set from the service's command descriptors.
    #[must_use]
    pub fn from_descriptors(descriptors: &[CommandDescriptor]) -> Self {
        Self::from_names(descriptors.iter().map(|d| d.command.as_str()))
    }

    /// Returns `true` if `name` is in the set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Returns the names in first-seen order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterates over the names in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns the number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Validates a command and builds its request path.
///
/// The command must be in `commands`; this is checked before the argument
/// count, so an unknown command is always reported as unavailable.
///
/// # Errors
///
/// Returns [`CommandError::Unavailable`] if `command` is not in `commands`,
/// or [`CommandError::TooManyArguments`] if more than one argument is given.
pub fn command_path(
    device_id: &str,
    commands: &CommandSet,
    command: &str,
    args: &[f64],
) -> Result<String, CommandError> {
    if !commands.contains(command) {
        return Err(CommandError::Unavailable(command.to_string()));
    }
    if args.len() > MAX_ARGUMENTS {
        return Err(CommandError::TooManyArguments(args.len()));
    }

    let mut path = format!(
        "/devices/{}/{}",
        urlencoding::encode(device_id),
        urlencoding::encode(command)
    );
    if let Some(arg) = args.first() {
        path.push('/');
        path.push_str(&format_argument(*arg));
    }
    Ok(path)
}

/// Renders a numeric argument as a path segment.
#[must_use]
pub fn format_argument(value: f64) -> String {
    format!("{value}")
}
