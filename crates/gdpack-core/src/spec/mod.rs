//! Addon source specifications.
//!
//! A [`Spec`] says where one addon comes from. Exactly one source variant is
//! active at a time:
//! - [`Source::Asset`]: an id in the public asset library
//! - [`Source::Git`]: a git repository, optionally pinned to a branch, tag or rev
//! - [`Source::Local`]: a path on the local filesystem

mod fields;
mod git;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use git::{GitReference, GitSource};

use fields::SpecFields;

use crate::{Error, Result};

/// Largest asset id that every manifest encoding can hold (TOML integers
/// are signed 64-bit).
pub const MAX_ASSET_ID: u64 = i64::MAX as u64;

/// Specification of a single addon: its source plus an optional version pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SpecFields", into = "SpecFields")]
pub struct Spec {
    /// Version pin, used by asset library sources
    pub version: Option<String>,
    /// Name of another addon this one stands in for when installing a target
    pub replace: Option<String>,
    pub source: Source,
}

/// Where an addon's files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Asset(AssetSource),
    Git(GitSource),
    Local(LocalSource),
}

/// An addon published to the asset library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetSource {
    pub id: u64,
}

/// An addon available on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSource {
    /// Absolute or project-relative path
    pub path: PathBuf,
}

impl Spec {
    pub fn from_source(source: impl Into<Source>) -> Self {
        Self {
            version: None,
            replace: None,
            source: source.into(),
        }
    }

    pub fn asset(id: u64) -> Self {
        Self::from_source(AssetSource { id })
    }

    pub fn git(source: GitSource) -> Self {
        Self::from_source(source)
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::from_source(LocalSource { path: path.into() })
    }

    /// Set the version pin.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Mark this addon as a replacement for the addon named `name`.
    pub fn replacing(mut self, name: impl Into<String>) -> Self {
        self.replace = Some(name.into());
        self
    }

    /// Check that the spec can be persisted and read back unchanged.
    ///
    /// Decoding only ever produces valid specs; values built in code are
    /// checked before they enter a manifest.
    pub fn validate(&self) -> Result<()> {
        if self.version.as_deref().is_some_and(str::is_empty) {
            return Err(Error::invalid_spec("'version' must not be empty"));
        }
        if self.replace.as_deref().is_some_and(str::is_empty) {
            return Err(Error::invalid_spec("'replace' must not be empty"));
        }

        match &self.source {
            Source::Asset(asset) if asset.id > MAX_ASSET_ID => Err(Error::invalid_spec(format!(
                "asset id {} is out of range (maximum {})",
                asset.id, MAX_ASSET_ID
            ))),
            Source::Asset(_) => Ok(()),
            Source::Git(git) => git.validate(),
            Source::Local(local) if local.path.as_os_str().is_empty() => {
                Err(Error::invalid_spec("'path' must not be empty"))
            }
            Source::Local(_) => Ok(()),
        }
    }

    pub fn as_git(&self) -> Option<&GitSource> {
        match &self.source {
            Source::Git(git) => Some(git),
            _ => None,
        }
    }
}

impl Source {
    /// Check if this is a git source.
    pub fn is_git(&self) -> bool {
        matches!(self, Self::Git(_))
    }

    /// Check if this is a local source.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// The addon name implied by the source when none is given explicitly.
    ///
    /// Git sources use the repository name (without a `.git` suffix) and local
    /// sources use the final path component. Asset ids carry no name.
    pub fn default_name(&self) -> Option<String> {
        match self {
            Self::Asset(_) => None,
            Self::Git(git) => git.repo_name(),
            Self::Local(local) => local
                .path
                .file_name()
                .and_then(std::ffi::OsStr::to_str)
                .map(str::to_owned),
        }
    }
}

impl From<AssetSource> for Source {
    fn from(value: AssetSource) -> Self {
        Self::Asset(value)
    }
}

impl From<GitSource> for Source {
    fn from(value: GitSource) -> Self {
        Self::Git(value)
    }
}

impl From<LocalSource> for Source {
    fn from(value: LocalSource) -> Self {
        Self::Local(value)
    }
}

impl From<&Path> for LocalSource {
    fn from(value: &Path) -> Self {
        Self {
            path: value.to_owned(),
        }
    }
}
