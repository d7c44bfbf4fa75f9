//! Clone strategy selection.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::spec::{GitReference, GitSource};
use crate::Result;

/// How a repository is materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneStrategy {
    /// Full history, then `rev` is checked out. A shallow fetch may not
    /// contain an arbitrary commit.
    Full { rev: String },
    /// Depth-1 clone of `reference` (a branch or tag), or of the remote's
    /// default branch when `None`.
    Shallow { reference: Option<String> },
}

impl CloneStrategy {
    /// Select a strategy; the order of precedence is rev, branch, tag, none.
    pub fn for_reference(reference: &GitReference) -> Self {
        match reference {
            GitReference::Rev(rev) => Self::Full { rev: rev.clone() },
            GitReference::Branch(branch) => Self::Shallow {
                reference: Some(branch.clone()),
            },
            GitReference::Tag(tag) => Self::Shallow {
                reference: Some(tag.clone()),
            },
            GitReference::DefaultBranch => Self::Shallow { reference: None },
        }
    }

    pub fn is_shallow(&self) -> bool {
        matches!(self, Self::Shallow { .. })
    }
}

/// A single `git` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    pub args: Vec<OsString>,
    /// Working directory; `None` runs in the caller's directory
    pub cwd: Option<PathBuf>,
}

/// The ordered git invocations that materialize a [`GitSource`] at a
/// destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonePlan {
    pub strategy: CloneStrategy,
    pub steps: Vec<GitCommand>,
}

impl ClonePlan {
    /// Build the plan for cloning `source` into `dest`.
    ///
    /// Fails with [`crate::Error::MissingRepository`] when the source has no
    /// URI.
    pub fn new(source: &GitSource, dest: &Path) -> Result<Self> {
        source.validate()?;

        let strategy = CloneStrategy::for_reference(&source.reference);

        let mut clone: Vec<OsString> = vec!["clone".into()];
        match &strategy {
            CloneStrategy::Full { .. } => {}
            CloneStrategy::Shallow { reference } => {
                clone.extend(["--depth".into(), "1".into()]);
                if let Some(reference) = reference {
                    clone.extend(["--branch".into(), reference.into()]);
                }
            }
        }
        clone.extend(["--".into(), (&source.uri).into(), dest.as_os_str().to_owned()]);

        let mut steps = vec![GitCommand {
            args: clone,
            cwd: None,
        }];

        if let CloneStrategy::Full { rev } = &strategy {
            steps.push(GitCommand {
                args: vec!["checkout".into(), "--detach".into(), rev.into()],
                cwd: Some(dest.to_path_buf()),
            });
        }

        Ok(Self { strategy, steps })
    }
}

impl GitCommand {
    /// Arguments for display and error reports.
    pub fn display_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}
