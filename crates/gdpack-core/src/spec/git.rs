//! Git source specification types.

use std::fmt;

/// Specification for a git source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSource {
    /// Repository URI (e.g., "https://github.com/org/repo.git")
    pub uri: String,
    /// Version constraint within the repository
    pub reference: GitReference,
}

/// The single version constraint a git dependency may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GitReference {
    /// Latest commit on the remote's default branch
    #[default]
    DefaultBranch,
    Branch(String),
    Tag(String),
    /// A specific commit
    Rev(String),
}

impl GitSource {
    /// Create a new GitSource tracking the default branch.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            reference: GitReference::DefaultBranch,
        }
    }

    /// Track a branch, replacing any existing reference.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.reference = GitReference::Branch(branch.into());
        self
    }

    /// Pin to a tag, replacing any existing reference.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.reference = GitReference::Tag(tag.into());
        self
    }

    /// Pin to a commit, replacing any existing reference.
    pub fn with_rev(mut self, rev: impl Into<String>) -> Self {
        self.reference = GitReference::Rev(rev.into());
        self
    }

    /// Build from optional `branch`/`tag`/`rev` values, at most one of which
    /// may be set.
    pub fn from_parts(
        uri: impl Into<String>,
        branch: Option<String>,
        tag: Option<String>,
        rev: Option<String>,
    ) -> crate::Result<Self> {
        let reference = match (branch, tag, rev) {
            (None, None, None) => GitReference::DefaultBranch,
            (Some(branch), None, None) => GitReference::Branch(branch),
            (None, Some(tag), None) => GitReference::Tag(tag),
            (None, None, Some(rev)) => GitReference::Rev(rev),
            _ => {
                return Err(crate::Error::invalid_spec(
                    "at most one of 'branch', 'tag' or 'rev' may be set",
                ));
            }
        };

        Ok(Self {
            uri: uri.into(),
            reference,
        })
    }

    /// Check that the repository URI and reference are non-empty.
    pub fn validate(&self) -> crate::Result<()> {
        if self.uri.trim().is_empty() {
            return Err(crate::Error::MissingRepository);
        }

        let empty_reference = match &self.reference {
            GitReference::DefaultBranch => None,
            GitReference::Branch(branch) if branch.is_empty() => Some("branch"),
            GitReference::Tag(tag) if tag.is_empty() => Some("tag"),
            GitReference::Rev(rev) if rev.is_empty() => Some("rev"),
            _ => None,
        };

        match empty_reference {
            Some(field) => Err(crate::Error::invalid_spec(format!(
                "'{}' must not be empty",
                field
            ))),
            None => Ok(()),
        }
    }

    /// The repository name: the last path segment of the URI without `.git`.
    pub fn repo_name(&self) -> Option<String> {
        let path = match url::Url::parse(&self.uri) {
            Ok(url) if url.has_host() || url.scheme() == "file" => url.path().to_string(),
            // scp-like syntax ("git@host:org/repo.git") or a bare path
            _ => self.uri.rsplit(':').next().unwrap_or(&self.uri).to_string(),
        };

        let name = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .map(|segment| segment.trim_end_matches(".git"))
            .filter(|segment| !segment.is_empty())?;

        Some(name.to_string())
    }
}

impl GitReference {
    pub fn branch(&self) -> Option<&str> {
        match self {
            Self::Branch(branch) => Some(branch),
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn rev(&self) -> Option<&str> {
        match self {
            Self::Rev(rev) => Some(rev),
            _ => None,
        }
    }
}

impl fmt::Display for GitReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultBranch => write!(f, "default branch"),
            Self::Branch(branch) => write!(f, "branch '{}'", branch),
            Self::Tag(tag) => write!(f, "tag '{}'", tag),
            Self::Rev(rev) => write!(f, "rev '{}'", rev),
        }
    }
}
