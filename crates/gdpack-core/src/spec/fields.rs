//! Flattened on-disk representation of a [`Spec`].
//!
//! Every source variant's fields live side by side in one table; decoding
//! rejects tables that name zero or several sources.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{AssetSource, GitReference, GitSource, LocalSource, Source, Spec};
use crate::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct SpecFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    replace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    asset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    git: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
}

/// Empty strings are treated the same as absent fields.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TryFrom<SpecFields> for Spec {
    type Error = Error;

    fn try_from(fields: SpecFields) -> Result<Self, Self::Error> {
        let git = non_empty(fields.git);
        let path = fields.path.filter(|p| !p.as_os_str().is_empty());
        let branch = non_empty(fields.branch);
        let tag = non_empty(fields.tag);
        let rev = non_empty(fields.rev);
        let has_reference = branch.is_some() || tag.is_some() || rev.is_some();

        let source = match (fields.asset, git, path) {
            (Some(id), None, None) => Source::Asset(AssetSource { id }),
            (None, Some(uri), None) => Source::Git(GitSource::from_parts(uri, branch, tag, rev)?),
            (None, None, Some(path)) => Source::Local(LocalSource { path }),
            (None, None, None) => {
                return Err(Error::invalid_spec(
                    "no source given; expected one of 'asset', 'git' or 'path'",
                ));
            }
            _ => {
                return Err(Error::invalid_spec(
                    "ambiguous source; only one of 'asset', 'git' or 'path' may be set",
                ));
            }
        };

        if has_reference && !source.is_git() {
            return Err(Error::invalid_spec(
                "'branch', 'tag' and 'rev' are only valid with 'git'",
            ));
        }

        let spec = Spec {
            version: non_empty(fields.version),
            replace: non_empty(fields.replace),
            source,
        };
        spec.validate()?;

        Ok(spec)
    }
}

impl From<Spec> for SpecFields {
    fn from(spec: Spec) -> Self {
        let mut fields = SpecFields {
            version: non_empty(spec.version),
            replace: non_empty(spec.replace),
            ..Default::default()
        };

        match spec.source {
            Source::Asset(asset) => fields.asset = Some(asset.id),
            Source::Local(local) => fields.path = Some(local.path),
            Source::Git(git) => {
                fields.git = non_empty(Some(git.uri));
                match git.reference {
                    GitReference::DefaultBranch => {}
                    GitReference::Branch(branch) => fields.branch = non_empty(Some(branch)),
                    GitReference::Tag(tag) => fields.tag = non_empty(Some(tag)),
                    GitReference::Rev(rev) => fields.rev = non_empty(Some(rev)),
                }
            }
        }

        fields
    }
}
