//! Selection of the environment and target scope a manifest operation applies to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Dependency installation environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    /// Not propagated to projects that depend on this one
    Development,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Development => write!(f, "development"),
        }
    }
}

/// Configuration for [`super::Manifest`] operations.
///
/// `target: None` selects the default scope. `Some(name)` selects the named
/// target scope, and an empty name is rejected with [`Error::MissingTarget`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub environment: Environment,
    pub target: Option<String>,
}

impl Query {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            target: None,
        }
    }

    pub fn production() -> Self {
        Self::new(Environment::Production)
    }

    pub fn development() -> Self {
        Self::new(Environment::Development)
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// The requested target name, if any.
    pub fn target_name(&self) -> Result<Option<&str>> {
        match self.target.as_deref() {
            None => Ok(None),
            Some("") => Err(Error::MissingTarget),
            Some(name) => Ok(Some(name)),
        }
    }
}
