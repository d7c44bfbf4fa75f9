//! Installation of resolved dependencies into a project's addons directory.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::addon;
use crate::git::{CloneStrategy, GitCloner};
use crate::manifest::{Dependency, Manifest, validate_name};
use crate::project::ProjectLayout;
use crate::spec::Source;
use crate::{Error, Result};

/// Options controlling which dependencies are installed.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Target scope layered over the default scope
    pub target: Option<String>,
    /// Skip development dependencies
    pub production_only: bool,
    /// Replace addons that are already present
    pub force: bool,
}

/// What happened to a single dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Cloned(CloneStrategy),
    Copied,
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledAddon {
    pub name: String,
    pub path: PathBuf,
    pub outcome: InstallOutcome,
}

/// Installs a manifest's dependencies one at a time.
#[derive(Debug, Clone)]
pub struct Installer {
    layout: ProjectLayout,
    cloner: GitCloner,
}

impl Installer {
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            cloner: GitCloner::new(),
        }
    }

    pub fn with_cloner(mut self, cloner: GitCloner) -> Self {
        self.cloner = cloner;
        self
    }

    /// Install every dependency selected by `options`.
    ///
    /// Stops at the first failure; dependencies installed before it are left in
    /// place. `cancel` aborts the running git process.
    pub async fn install<F>(
        &self,
        manifest: &Manifest,
        options: &InstallOptions,
        cancel: F,
    ) -> anyhow::Result<Vec<InstalledAddon>>
    where
        F: Future<Output = ()>,
    {
        let deps = manifest
            .installable(options.target.as_deref(), !options.production_only)
            .context("Failed to resolve dependencies")?;

        tracing::info!(count = deps.len(), "installing dependencies");

        tokio::pin!(cancel);

        let mut installed = Vec::with_capacity(deps.len());
        for dep in &deps {
            let result = self
                .install_dependency(dep, options.force, cancel.as_mut())
                .await
                .with_context(|| format!("Failed to install addon '{}'", dep.name))?;
            installed.push(result);
        }

        Ok(installed)
    }

    /// Install a single dependency into `addons/<name>`.
    ///
    /// The addon is assembled in a hidden sibling directory and only moved
    /// into place once complete, so a failed or cancelled install leaves any
    /// previously installed copy untouched.
    pub async fn install_dependency<F>(
        &self,
        dep: &Dependency,
        force: bool,
        cancel: F,
    ) -> Result<InstalledAddon>
    where
        F: Future<Output = ()>,
    {
        validate_name(&dep.name)?;
        let dest = self.layout.addon_dir(&dep.name);

        if let Source::Asset(asset) = &dep.spec.source {
            tracing::warn!(name = %dep.name, id = asset.id, "skipping asset library addon");
            return Ok(InstalledAddon {
                name: dep.name.clone(),
                path: dest,
                outcome: InstallOutcome::Skipped {
                    reason: format!(
                        "asset library downloads are not supported (asset {})",
                        asset.id
                    ),
                },
            });
        }

        if !force && fs::symlink_metadata(&dest).is_ok() {
            return Err(Error::AlreadyExists { path: dest });
        }

        let addons_dir = self.layout.addons_dir();
        fs::create_dir_all(&addons_dir).map_err(|e| Error::io(&addons_dir, e))?;

        let staging = sibling_temp_path(&dest, "tmp")?;
        let staged = self.stage(dep, &dest, &staging, cancel).await;
        let outcome = match staged {
            Ok(outcome) => outcome,
            Err(err) => {
                remove_quietly(&staging);
                return Err(err);
            }
        };

        if let Err(err) = swap_into_place(&staging, &dest) {
            remove_quietly(&staging);
            return Err(err);
        }

        tracing::info!(name = %dep.name, dest = %dest.display(), "installed addon");

        Ok(InstalledAddon {
            name: dep.name.clone(),
            path: dest,
            outcome,
        })
    }

    /// Fetch the dependency and copy its addon directory to `staging`.
    async fn stage<F>(
        &self,
        dep: &Dependency,
        dest: &Path,
        staging: &Path,
        cancel: F,
    ) -> Result<InstallOutcome>
    where
        F: Future<Output = ()>,
    {
        match &dep.spec.source {
            Source::Git(git) => {
                let checkout = sibling_temp_path(dest, "checkout")?;
                let result = async {
                    let strategy = self.cloner.clone_repo(git, &checkout, cancel).await?;
                    let dir = addon::find_addon_dir(&checkout, &dep.name)?;
                    addon::copy_addon(&dir, staging)?;
                    Ok::<_, Error>(InstallOutcome::Cloned(strategy))
                }
                .await;
                remove_quietly(&checkout);
                result
            }
            Source::Local(local) => {
                let src = self.layout.resolve(&local.path);
                if !src.is_dir() {
                    return Err(Error::io(
                        &src,
                        std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "local addon directory not found",
                        ),
                    ));
                }
                let dir = addon::find_addon_dir(&src, &dep.name)?;
                addon::copy_addon(&dir, staging)?;
                Ok(InstallOutcome::Copied)
            }
            Source::Asset(asset) => Err(Error::invalid_spec(format!(
                "asset {} cannot be staged",
                asset.id
            ))),
        }
    }
}

/// Move `staging` to `dest`, replacing whatever is at `dest`.
///
/// An existing `dest` is first renamed aside and restored if the final rename
/// fails.
fn swap_into_place(staging: &Path, dest: &Path) -> Result<()> {
    let backup = match fs::symlink_metadata(dest) {
        Ok(_) => {
            let backup = sibling_temp_path(dest, "old")?;
            tracing::debug!(dest = %dest.display(), "replacing existing addon");
            fs::rename(dest, &backup).map_err(|e| Error::io(dest, e))?;
            Some(backup)
        }
        Err(_) => None,
    };

    if let Err(err) = fs::rename(staging, dest) {
        if let Some(backup) = &backup
            && let Err(restore) = fs::rename(backup, dest)
        {
            tracing::warn!(
                backup = %backup.display(),
                error = %restore,
                "failed to restore previous addon"
            );
        }
        return Err(Error::io(dest, err));
    }

    if let Some(backup) = backup {
        remove_quietly(&backup);
    }

    Ok(())
}

/// A hidden, unused path next to `path`: `.<name>.<label>.<pid>[.<n>]`.
fn sibling_temp_path(path: &Path, label: &str) -> Result<PathBuf> {
    let invalid = || {
        Error::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent"),
        )
    };
    let parent = path.parent().ok_or_else(invalid)?;
    let base = path.file_name().ok_or_else(invalid)?.to_string_lossy();

    for attempt in 0u32..1000 {
        let name = match attempt {
            0 => format!(".{}.{}.{}", base, label, std::process::id()),
            n => format!(".{}.{}.{}.{}", base, label, std::process::id(), n),
        };
        let candidate = parent.join(name);
        if fs::symlink_metadata(&candidate).is_err() {
            return Ok(candidate);
        }
    }

    Err(Error::AlreadyExists {
        path: parent.join(format!(".{}.{}", base, label)),
    })
}

fn remove_quietly(path: &Path) {
    let removed = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(_) => return,
    };

    if let Err(err) = removed {
        tracing::warn!(path = %path.display(), error = %err, "failed to remove temporary files");
    }
}
