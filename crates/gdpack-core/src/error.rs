//! Error types shared by manifest, spec and git operations.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A target scope was requested but its name is empty.
    #[error("Missing target: a target scope was requested without a name")]
    MissingTarget,

    #[error("Missing repository: git dependency has no repository URI")]
    MissingRepository,

    #[error("Missing executable: could not find a 'git' command")]
    MissingExecutable,

    #[error("Destination already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Invalid dependency specification: {reason}")]
    InvalidSpec { reason: String },

    /// The persisted manifest could not be decoded.
    #[error("Failed to parse manifest{}: {message}", location(path))]
    Decode {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("Failed to serialize manifest: {message}")]
    Encode { message: String },

    /// A git invocation exited unsuccessfully; `stderr` holds its diagnostics.
    #[error("Git command failed {command:?} ({status}): {stderr}")]
    ProcessFailure {
        command: Vec<String>,
        status: String,
        stderr: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_spec(reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error came from decoding a persisted manifest.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

fn location(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" {}", path.display()),
        None => String::new(),
    }
}
