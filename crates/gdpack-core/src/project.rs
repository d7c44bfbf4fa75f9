//! Project path resolution helpers.

use std::path::{Path, PathBuf};

/// Default manifest file name at the project root.
pub const MANIFEST_FILE_NAME: &str = "gdpack.toml";

/// Manifest file name for projects that keep their manifest as JSON.
pub const JSON_MANIFEST_FILE_NAME: &str = "gdpack.json";

/// Directory, relative to the project root, that addons are installed into.
pub const ADDONS_DIR_NAME: &str = "addons";

/// Locations of the files gdpack manages inside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    manifest_path: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let manifest_path = root.join(MANIFEST_FILE_NAME);
        Self {
            root,
            manifest_path,
        }
    }

    /// Use a manifest file other than `gdpack.toml` (e.g. `gdpack.json`).
    pub fn with_manifest_file(mut self, file_name: impl AsRef<Path>) -> Self {
        self.manifest_path = self.root.join(file_name);
        self
    }

    /// A layout rooted at the current working directory.
    pub fn current_dir() -> crate::Result<Self> {
        let root = std::env::current_dir().map_err(|e| crate::Error::io(".", e))?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path.clone()
    }

    pub fn addons_dir(&self) -> PathBuf {
        self.root.join(ADDONS_DIR_NAME)
    }

    /// Install location for the addon `name`.
    pub fn addon_dir(&self, name: &str) -> PathBuf {
        self.addons_dir().join(name)
    }

    /// Resolve a project-relative path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
