// SPDX-License-Identifier: MIT

//! Stack-specific actions.
//!
//! One module per stack. Every action follows the same shape: gather
//! its options from `ActionParams` (missing required option is a
//! configuration error), verify prerequisite files in the directory to
//! mount, mount, execute through the capability traits, and return an
//! [`Output`](crate::dispatch::Output). Any failure is terminal.

pub mod docker;
pub mod ecr;
pub mod ecs;
pub mod terragrunt;

use crate::error::ActionError;

/// Fetch a required option or fail configuration.
pub(crate) fn required<'a>(
    value: &'a Option<String>,
    option: &str,
) -> Result<&'a str, ActionError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        _ => Err(ActionError::Configuration(format!(
            "option {option} is required"
        ))),
    }
}
