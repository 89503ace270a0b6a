// SPDX-License-Identifier: MIT

//! Identifier and random-name generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of job and task identifiers.
pub trait IdGen: Clone + Send + Sync {
    fn next(&self) -> String;
}

/// Random v4 uuids; what the binary wires in.
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-N` ids for tests.
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

/// Generate a short lowercase alphanumeric suffix, used for default
/// container names and random image tags.
pub fn random_suffix(len: usize) -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    raw.chars().take(len).collect()
}

/// Generate a random name with the given prefix, e.g. `rand-cont-3fa9c`
pub fn random_name(prefix: &str, suffix_len: usize) -> String {
    format!("{}{}", prefix, random_suffix(suffix_len))
}
