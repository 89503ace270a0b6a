// SPDX-License-Identifier: MIT

//! CLI command modules

pub mod aws;
pub mod common;
pub mod docker;
pub mod infra;
