//! Git cloner for materializing git-sourced addons.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::process::Command;

use super::{ClonePlan, CloneStrategy, GitCommand};
use crate::spec::GitSource;
use crate::{Error, Result};

/// Clones git repositories by invoking the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCloner {
    program: PathBuf,
}

impl Default for GitCloner {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCloner {
    /// Create a cloner that uses `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Ensure a usable git executable is available.
    pub async fn ensure_git(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("--version")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(Error::MissingExecutable);
        }

        tracing::debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "found git"
        );

        Ok(())
    }

    /// Clone `source` into `dest`, which must not exist yet.
    ///
    /// Branch, tag and default-branch sources are cloned with depth 1. A rev
    /// requires the full history followed by a checkout of that commit.
    /// `cancel` is raced against every git invocation; when it completes first
    /// the running process is killed and [`Error::Cancelled`] is returned.
    /// Any failure after the clone started removes the partial destination.
    pub async fn clone_repo<F>(
        &self,
        source: &GitSource,
        dest: &Path,
        cancel: F,
    ) -> Result<CloneStrategy>
    where
        F: Future<Output = ()>,
    {
        let plan = ClonePlan::new(source, dest)?;

        if dest.exists() {
            return Err(Error::AlreadyExists {
                path: dest.to_path_buf(),
            });
        }

        tokio::pin!(cancel);

        tokio::select! {
            biased;
            _ = &mut cancel => return Err(Error::Cancelled),
            result = self.ensure_git() => result?,
        }

        tracing::info!(
            uri = %source.uri,
            reference = %source.reference,
            dest = %dest.display(),
            shallow = plan.strategy.is_shallow(),
            "cloning repository"
        );

        for step in &plan.steps {
            if let Err(err) = self.run_step(step, cancel.as_mut()).await {
                Self::remove_partial(dest);
                return Err(err);
            }
        }

        tracing::info!(dest = %dest.display(), "cloned repository");

        Ok(plan.strategy)
    }

    /// Blocking variant of [`GitCloner::clone_repo`] without cancellation.
    ///
    /// Must not be called from within an async runtime.
    pub fn clone_repo_blocking(&self, source: &GitSource, dest: &Path) -> Result<CloneStrategy> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::io(dest, e))?;

        runtime.block_on(self.clone_repo(source, dest, std::future::pending()))
    }

    async fn run_step<F>(&self, step: &GitCommand, cancel: Pin<&mut F>) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(&step.args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &step.cwd {
            cmd.current_dir(dir);
        }

        let args = step.display_args();
        tracing::debug!(?args, "running git");

        let output = tokio::select! {
            biased;
            _ = cancel => {
                tracing::debug!(?args, "git cancelled");
                return Err(Error::Cancelled);
            }
            output = cmd.output() => output.map_err(|e| self.spawn_error(e))?,
        };

        if !output.status.success() {
            return Err(Error::ProcessFailure {
                command: args,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }

    fn spawn_error(&self, err: std::io::Error) -> Error {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::MissingExecutable
        } else {
            Error::io(&self.program, err)
        }
    }

    fn remove_partial(dest: &Path) {
        if !dest.exists() {
            return;
        }
        if let Err(err) = std::fs::remove_dir_all(dest) {
            tracing::warn!(
                dest = %dest.display(),
                error = %err,
                "failed to remove partial clone"
            );
        }
    }
}
