// SPDX-License-Identifier: MIT

//! Directory resolution for the work/mount/target hierarchy.
//!
//! A pipeline runs against three nested directories: the working
//! directory, the directory mounted into the container, and the target
//! (execution) directory. The mount directory must be the working
//! directory itself or a strict descendant of it; the target directory
//! must be the mount directory itself or a strict descendant of it.
//! The invocation root (the current directory) is resolved alongside
//! them but carries no containment constraint.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which of the three directories is being resolved. Only changes error
/// messages; resolution logic is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    Root,
    Work,
    Mount,
    Target,
}

impl std::fmt::Display for DirKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DirKind::Root => "root",
            DirKind::Work => "working",
            DirKind::Mount => "mount",
            DirKind::Target => "target",
        };
        write!(f, "{label}")
    }
}

/// Errors from directory resolution
#[derive(Debug, Error)]
pub enum DirError {
    #[error("{kind} directory {path} does not exist")]
    DirectoryNotFound { kind: DirKind, path: PathBuf },
    #[error("{kind} directory {path} is not a directory")]
    NotADirectory { kind: DirKind, path: PathBuf },
    #[error("{kind} directory {child} is not a subdirectory of {parent}")]
    NotASubdirectory {
        kind: DirKind,
        child: PathBuf,
        parent: PathBuf,
    },
    #[error("failed to resolve {kind} directory {path}: {source}")]
    Io {
        kind: DirKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A directory as declared by the caller plus its resolved absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDir {
    pub declared: String,
    pub path: PathBuf,
}

/// Resolve a declared path against a reference directory.
///
/// Empty or `.` input resolves to the reference itself. A relative input
/// is joined with the reference; an absolute input is used as-is. The
/// result must exist and be a directory.
pub fn resolve(declared: &str, reference: &Path, kind: DirKind) -> Result<ResolvedDir, DirError> {
    let declared = declared.trim();

    let candidate = if declared.is_empty() || declared == "." {
        reference.to_path_buf()
    } else if Path::new(declared).is_absolute() {
        PathBuf::from(declared)
    } else {
        reference.join(declared)
    };

    let path = validated(&candidate, kind)?;
    Ok(ResolvedDir {
        declared: declared.to_string(),
        path,
    })
}

/// Resolve a declared path against a parent directory and enforce that
/// the result is the parent itself or a descendant of it.
pub fn resolve_under(
    declared: &str,
    parent: &ResolvedDir,
    kind: DirKind,
) -> Result<ResolvedDir, DirError> {
    let resolved = resolve(declared, &parent.path, kind)?;
    ensure_contained(&resolved.path, &parent.path, kind)?;
    Ok(resolved)
}

/// Containment check via relative-path derivation: the child must not
/// escape the parent. The parent itself is accepted.
pub fn ensure_contained(child: &Path, parent: &Path, kind: DirKind) -> Result<(), DirError> {
    if child.strip_prefix(parent).is_ok() {
        return Ok(());
    }
    Err(DirError::NotASubdirectory {
        kind,
        child: child.to_path_buf(),
        parent: parent.to_path_buf(),
    })
}

/// Whether `path` lives inside a git repository (the target-module check
/// for the terragrunt stack). Ascends from `path` to the filesystem root.
pub fn in_git_repository(path: &Path) -> bool {
    let mut current = Some(path);
    while let Some(dir) = current {
        if dir.join(".git").is_dir() {
            return true;
        }
        current = dir.parent();
    }
    false
}

fn validated(candidate: &Path, kind: DirKind) -> Result<PathBuf, DirError> {
    let meta = std::fs::metadata(candidate).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DirError::DirectoryNotFound {
                kind,
                path: candidate.to_path_buf(),
            }
        } else {
            DirError::Io {
                kind,
                path: candidate.to_path_buf(),
                source: e,
            }
        }
    })?;

    if !meta.is_dir() {
        return Err(DirError::NotADirectory {
            kind,
            path: candidate.to_path_buf(),
        });
    }

    std::fs::canonicalize(candidate).map_err(|e| DirError::Io {
        kind,
        path: candidate.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
#[path = "dirs_tests.rs"]
mod tests;
