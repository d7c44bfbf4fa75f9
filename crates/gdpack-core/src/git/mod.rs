//! Git acquisition of addon dependencies.
//!
//! Strategy selection is a pure step ([`ClonePlan`]) kept apart from process
//! execution ([`GitCloner`]):
//! - rev: full clone, then checkout of the commit
//! - branch or tag: depth-1 clone of that ref
//! - nothing: depth-1 clone of the default branch

mod cloner;
mod plan;

use std::future::Future;
use std::path::Path;

pub use cloner::GitCloner;
pub use plan::{ClonePlan, CloneStrategy, GitCommand};

use crate::Result;
use crate::spec::GitSource;

/// Clone `source` into `dest` with the `git` found on `PATH`.
pub async fn clone<F>(source: &GitSource, dest: &Path, cancel: F) -> Result<CloneStrategy>
where
    F: Future<Output = ()>,
{
    GitCloner::new().clone_repo(source, dest, cancel).await
}
