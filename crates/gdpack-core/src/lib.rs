//! gdpack Core Library
//!
//! Provides the dependency manifest, addon source specifications and git
//! acquisition behind the `gdpack` addon manager.

pub mod addon;
pub mod error;
pub mod git;
pub mod install;
pub mod manifest;
pub mod project;
pub mod spec;

pub use error::{Error, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Manifest
    pub use crate::manifest::{
        Dependency, DependencySet, Environment, Manifest, ManifestFormat, ManifestStore, Query,
    };

    // Spec
    pub use crate::spec::{AssetSource, GitReference, GitSource, LocalSource, Source, Spec};

    // Git
    pub use crate::git::{ClonePlan, CloneStrategy, GitCloner};

    // Install
    pub use crate::install::{InstallOptions, InstallOutcome, InstalledAddon, Installer};
    pub use crate::project::ProjectLayout;

    pub use crate::{Error, Result};
}
