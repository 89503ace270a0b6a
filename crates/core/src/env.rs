// SPDX-License-Identifier: MIT

//! Environment-variable acquisition and merging.
//!
//! Variables come from up to seven independently-enabled sources. Each
//! scan reads from an [`EnvSnapshot`] captured once per invocation, so
//! repeated scans are deterministic and tests can inject their own
//! environment. The merge order across sources is declared exactly once
//! in [`EnvLayer::ORDER`]; later layers win on key collision.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Variable name → value. BTreeMap keeps iteration order stable.
pub type EnvMap = BTreeMap<String, String>;

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_REGION: &str = "AWS_REGION";
pub const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// Prefix carried by variables meant for terraform/terragrunt.
pub const TERRAFORM_PREFIX: &str = "TF_VAR_";

/// Errors from environment scanning
#[derive(Debug, Error)]
pub enum EnvScanError {
    #[error("cloud credential variable {0} is not set or is empty")]
    CredentialsNotSet(String),
    #[error("no environment variables with prefix {0} found")]
    NoMatchingEnvVars(String),
    #[error("environment variable {0} has an empty value")]
    EmptyEnvVarValue(String),
    #[error("environment variable {0} does not exist")]
    MissingEnvVar(String),
    #[error("malformed line in env file {file}: {line:?}")]
    MalformedLine { file: PathBuf, line: String },
    #[error("env file {0} contains no variables")]
    EmptyFile(PathBuf),
    #[error("environment variable {0} was passed with an empty value")]
    InconsistentEnvVar(String),
    #[error("no prefixes provided for the prefix scan")]
    NoPrefixes,
    #[error("failed to read env file: {0}")]
    Io(#[from] std::io::Error),
}

/// Strip one layer of surrounding double quotes from a value.
pub fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

/// An immutable capture of the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: EnvMap,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// The entire snapshot verbatim, quote-stripped. Host-wide scan.
    pub fn all(&self) -> EnvMap {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), strip_quotes(v).to_string()))
            .collect()
    }

    /// Every listed key must exist and be non-empty. Used by the
    /// pipeline precondition on keys the caller promised to export.
    pub fn require_set(&self, keys: &[String]) -> Result<(), EnvScanError> {
        for key in keys {
            match self.get(key) {
                Some(v) if !v.is_empty() => {}
                _ => return Err(EnvScanError::EmptyEnvVarValue(key.clone())),
            }
        }
        Ok(())
    }

    /// Fetch the listed keys as a map. Keys in `optional` are skipped
    /// when absent instead of failing.
    pub fn scan_keys(&self, keys: &[String], optional: &[String]) -> Result<EnvMap, EnvScanError> {
        let mut result = EnvMap::new();
        for key in keys {
            match self.get(key) {
                Some(value) => {
                    result.insert(key.clone(), strip_quotes(value).to_string());
                }
                None if optional.contains(key) => continue,
                None => return Err(EnvScanError::MissingEnvVar(key.clone())),
            }
        }
        Ok(result)
    }

    /// Scan AWS credentials. Access key and secret key are mandatory
    /// and must be non-empty; region keys are optional. When both
    /// region variants exist, the default-region variant wins and is
    /// written into `AWS_REGION`.
    pub fn scan_aws_credentials(&self) -> Result<EnvMap, EnvScanError> {
        for key in [AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY] {
            match self.get(key) {
                Some(v) if !v.is_empty() => {}
                _ => return Err(EnvScanError::CredentialsNotSet(key.to_string())),
            }
        }

        let mandatory = [AWS_ACCESS_KEY_ID.to_string(), AWS_SECRET_ACCESS_KEY.to_string()];
        let optional = [AWS_REGION.to_string(), AWS_DEFAULT_REGION.to_string()];
        let all: Vec<String> = mandatory.iter().chain(optional.iter()).cloned().collect();
        let mut envs = self.scan_keys(&all, &optional)?;

        // Precedence: the default-region variant overrides the plain one.
        if let Some(default_region) = envs.get(AWS_DEFAULT_REGION).cloned() {
            envs.insert(AWS_REGION.to_string(), default_region);
        }

        Ok(envs)
    }

    /// Collect every variable whose name carries the given prefix.
    pub fn scan_prefix(&self, prefix: &str) -> Result<EnvMap, EnvScanError> {
        let mut result = EnvMap::new();
        for (key, value) in &self.vars {
            if key.starts_with(prefix) {
                if value.is_empty() {
                    return Err(EnvScanError::EmptyEnvVarValue(key.clone()));
                }
                result.insert(key.clone(), strip_quotes(value).to_string());
            }
        }
        if result.is_empty() {
            return Err(EnvScanError::NoMatchingEnvVars(prefix.to_string()));
        }
        Ok(result)
    }

    /// Scan variables meant for the infrastructure tool (`TF_VAR_`).
    pub fn scan_terraform(&self) -> Result<EnvMap, EnvScanError> {
        self.scan_prefix(TERRAFORM_PREFIX)
    }

    /// Scan a caller-supplied list of prefixes, each independently
    /// resolved, unioned into one map.
    pub fn scan_prefixes(&self, prefixes: &[String]) -> Result<EnvMap, EnvScanError> {
        if prefixes.is_empty() {
            return Err(EnvScanError::NoPrefixes);
        }
        let mut result = EnvMap::new();
        for prefix in prefixes {
            let scanned = self.scan_prefix(prefix.trim())?;
            result.extend(scanned);
        }
        Ok(result)
    }
}

impl FromIterator<(String, String)> for EnvSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Parse a dotenv-style file of `KEY=VALUE` lines. Blank lines are
/// skipped, outer quotes are stripped from values.
pub fn scan_dotenv(path: &Path) -> Result<EnvMap, EnvScanError> {
    let contents = std::fs::read_to_string(path)?;
    let mut result = EnvMap::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(EnvScanError::MalformedLine {
                file: path.to_path_buf(),
                line: line.to_string(),
            });
        };
        result.insert(
            key.trim().to_string(),
            strip_quotes(value.trim()).to_string(),
        );
    }

    if result.is_empty() {
        return Err(EnvScanError::EmptyFile(path.to_path_buf()));
    }
    Ok(result)
}

/// Explicit key-value pairs are only checked for empty values.
pub fn validate_pairs(pairs: &EnvMap) -> Result<(), EnvScanError> {
    for (key, value) in pairs {
        if value.is_empty() {
            return Err(EnvScanError::InconsistentEnvVar(key.clone()));
        }
    }
    Ok(())
}

/// The named environment sources, in merge order. Later layers override
/// earlier, more "automatic" ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvLayer {
    Aws,
    Terraform,
    Custom,
    Host,
    Explicit,
    Dotenv,
    Prefix,
}

impl EnvLayer {
    /// Declared merge order. This ordering is a contract: callers never
    /// re-declare it.
    pub const ORDER: [EnvLayer; 7] = [
        EnvLayer::Aws,
        EnvLayer::Terraform,
        EnvLayer::Custom,
        EnvLayer::Host,
        EnvLayer::Explicit,
        EnvLayer::Dotenv,
        EnvLayer::Prefix,
    ];
}

impl std::fmt::Display for EnvLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EnvLayer::Aws => "aws",
            EnvLayer::Terraform => "terraform",
            EnvLayer::Custom => "custom",
            EnvLayer::Host => "host",
            EnvLayer::Explicit => "explicit",
            EnvLayer::Dotenv => "dotenv",
            EnvLayer::Prefix => "prefix",
        };
        write!(f, "{label}")
    }
}

/// The per-job environment, one map per source.
#[derive(Debug, Clone, Default)]
pub struct JobEnv {
    pub aws: EnvMap,
    pub terraform: EnvMap,
    pub custom: EnvMap,
    pub host: EnvMap,
    pub explicit: EnvMap,
    pub dotenv: EnvMap,
    pub prefix: EnvMap,
}

impl JobEnv {
    pub fn layer(&self, layer: EnvLayer) -> &EnvMap {
        match layer {
            EnvLayer::Aws => &self.aws,
            EnvLayer::Terraform => &self.terraform,
            EnvLayer::Custom => &self.custom,
            EnvLayer::Host => &self.host,
            EnvLayer::Explicit => &self.explicit,
            EnvLayer::Dotenv => &self.dotenv,
            EnvLayer::Prefix => &self.prefix,
        }
    }

    /// Merge all layers in [`EnvLayer::ORDER`]. Last write wins.
    pub fn merged(&self) -> EnvMap {
        merge(EnvLayer::ORDER.iter().map(|l| self.layer(*l)))
    }
}

/// Merge maps left to right: later maps win on collision, empty keys
/// and empty values never survive the merge.
pub fn merge<'a>(maps: impl IntoIterator<Item = &'a EnvMap>) -> EnvMap {
    let mut result = EnvMap::new();
    for map in maps {
        for (key, value) in map {
            if key.is_empty() || value.is_empty() {
                continue;
            }
            result.insert(key.clone(), strip_quotes(value).to_string());
        }
    }
    result
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
