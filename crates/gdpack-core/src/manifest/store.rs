//! Manifest store for loading and saving a project's manifest file.

use std::path::{Path, PathBuf};

use super::{Manifest, format};
use crate::Result;
use crate::project::ProjectLayout;

#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_project(layout: &ProjectLayout) -> Self {
        Self::new(layout.manifest_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the manifest, treating a missing file as an empty manifest.
    pub fn load(&self) -> Result<Manifest> {
        if !self.path.exists() {
            return Ok(Manifest::new());
        }
        format::parse_file(&self.path)
    }

    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        format::write(manifest, &self.path)
    }
}
