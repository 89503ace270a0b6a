// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: a Docker-CLI-backed execution engine and
//! an AWS-CLI-backed cloud client.

pub mod aws;
pub mod docker;
pub mod noop;

pub use aws::AwsCliClient;
pub use docker::DockerCliEngine;
pub use noop::NoOpCloudClient;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use gantry_core::fakes::{CloudCall, EngineCall, FakeCloud, FakeEngine};
