//! Interpretation of the `<URI>` argument given to `gdpack add`.

use std::path::PathBuf;

use anyhow::Context;

use gdpack_core::spec::{AssetSource, GitSource, LocalSource, Source};

const GIT_SCHEMES: &[&str] = &["http", "https", "ssh", "git", "file"];

/// Turn a user-supplied URI into a source.
///
/// Supports formats:
/// - `asset:1234` (asset library id)
/// - `git:<url>` or any URL with a git-capable scheme
/// - `git@host:org/repo.git` (scp-like syntax)
/// - anything ending in `.git`
/// - `path:<dir>` or any other string, taken as a filesystem path
pub fn parse_source(uri: &str) -> anyhow::Result<Source> {
    if let Some(id) = uri.strip_prefix("asset:") {
        let id = id
            .parse::<u64>()
            .with_context(|| format!("Invalid asset id: '{}'", id))?;
        return Ok(AssetSource { id }.into());
    }
    // `git://host/...` is a URL in its own right, not the `git:` prefix.
    if let Some(url) = uri.strip_prefix("git:").filter(|rest| !rest.starts_with("//")) {
        anyhow::ensure!(!url.trim().is_empty(), "Missing repository after 'git:'");
        return Ok(GitSource::new(url).into());
    }
    if let Some(path) = uri.strip_prefix("path:") {
        anyhow::ensure!(!path.is_empty(), "Missing path after 'path:'");
        return Ok(LocalSource {
            path: PathBuf::from(path),
        }
        .into());
    }

    anyhow::ensure!(!uri.trim().is_empty(), "Missing dependency URI");

    if looks_like_git(uri) {
        return Ok(GitSource::new(uri).into());
    }

    Ok(LocalSource {
        path: PathBuf::from(uri),
    }
    .into())
}

fn looks_like_git(uri: &str) -> bool {
    if let Ok(url) = url::Url::parse(uri)
        && GIT_SCHEMES.contains(&url.scheme())
    {
        return true;
    }

    if uri.trim_end_matches('/').ends_with(".git") {
        return true;
    }

    // scp-like: user@host:path
    match uri.split_once(':') {
        Some((host, path)) => host.contains('@') && !host.contains('/') && !path.is_empty(),
        None => false,
    }
}
