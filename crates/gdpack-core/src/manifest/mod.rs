//! Project dependency manifest.
//!
//! A [`Manifest`] holds a default-scope [`DependencySet`] plus per-target
//! override sets. Listing a target overlays its set on the default scope:
//! - target entries replace default entries with the same name
//! - names unique to either scope are kept
//!
//! Only `add`/`remove` create or drop target scopes; listing never does.

mod dependency_set;
pub mod format;
pub mod merge;
mod query;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::spec::Spec;
use crate::{Error, Result};

pub use dependency_set::DependencySet;
pub use format::{ManifestFormat, parse, parse_file, parse_str, to_string, write};
pub use query::{Environment, Query};
pub use store::ManifestStore;

/// A named addon specification, as returned by list operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub spec: Spec,
}

impl Dependency {
    pub fn new(name: impl Into<String>, spec: Spec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}

/// Mapping from environment/target to the project's direct dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ManifestFile", into = "ManifestFile")]
pub struct Manifest {
    root: DependencySet,
    targets: BTreeMap<String, DependencySet>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default-scope dependency set.
    pub fn root(&self) -> &DependencySet {
        &self.root
    }

    /// The override set registered for `target`, if any.
    pub fn target(&self, target: &str) -> Option<&DependencySet> {
        self.targets.get(target)
    }

    /// Names of targets with at least one dependency.
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.targets.values().all(DependencySet::is_empty)
    }

    /// Record `spec` under `name` in the scope and environment selected by
    /// `query`. An existing entry for `name` in that scope is replaced.
    ///
    /// Fails with `InvalidSpec` for a spec that could not be read back once
    /// persisted, or for a replacement outside a target scope.
    pub fn add(&mut self, name: impl Into<String>, spec: Spec, query: &Query) -> Result<()> {
        let name = name.into();
        let env = query.environment;

        validate_name(&name)?;
        spec.validate()?;

        match query.target_name()? {
            None if spec.replace.is_some() => {
                return Err(Error::invalid_spec(format!(
                    "'{}' replaces an addon but is not in a target scope",
                    name
                )));
            }
            None => {
                tracing::debug!(%name, %env, "adding dependency to default scope");
                self.root.add(name, spec, env);
            }
            Some(target) => {
                tracing::debug!(%name, %env, scope = target, "adding dependency to target scope");
                self.targets
                    .entry(target.to_string())
                    .or_default()
                    .add(name, spec, env);
            }
        }

        Ok(())
    }

    /// Record `spec` for each of `targets`, or the default scope when
    /// `targets` is empty.
    pub fn add_to_targets(
        &mut self,
        name: &str,
        spec: &Spec,
        env: Environment,
        targets: &[String],
    ) -> Result<()> {
        if targets.is_empty() {
            return self.add(name, spec.clone(), &Query::new(env));
        }

        for target in targets {
            self.add(name, spec.clone(), &Query::new(env).with_target(target))?;
        }

        Ok(())
    }

    /// Remove `name` from both environments of the scope selected by `query`.
    ///
    /// Returns whether anything was removed. A target scope left empty is
    /// dropped.
    pub fn remove(&mut self, name: &str, query: &Query) -> Result<bool> {
        let removed = match query.target_name()? {
            None => self.root.remove(name),
            Some(target) => {
                let Some(set) = self.targets.get_mut(target) else {
                    return Ok(false);
                };
                let removed = set.remove(name);
                if set.is_empty() {
                    self.targets.remove(target);
                }
                removed
            }
        };

        tracing::debug!(name, removed, "removed dependency");

        Ok(removed)
    }

    /// Remove `name` from each of `targets`, or the default scope when
    /// `targets` is empty.
    pub fn remove_from_targets(&mut self, name: &str, targets: &[String]) -> Result<bool> {
        if targets.is_empty() {
            return self.remove(name, &Query::default());
        }

        let mut removed = false;
        for target in targets {
            removed |= self.remove(name, &Query::default().with_target(target))?;
        }

        Ok(removed)
    }

    /// The effective dependency list for the query's environment and target.
    pub fn list(&self, query: &Query) -> Result<Vec<Dependency>> {
        let env = query.environment;
        let base = self.root.list(env);

        let Some(target) = query.target_name()? else {
            return Ok(merge::overlay(base, Vec::new()));
        };

        let layer = self
            .targets
            .get(target)
            .map(|set| set.list(env))
            .unwrap_or_default();

        Ok(merge::overlay(base, layer))
    }

    /// Production dependencies for `target`; an empty name selects the
    /// default scope.
    pub fn list_with_target(&self, target: &str) -> Vec<Dependency> {
        self.list_scope(Environment::Production, target)
    }

    /// Development dependencies for `target`; an empty name selects the
    /// default scope.
    pub fn list_dev_with_target(&self, target: &str) -> Vec<Dependency> {
        self.list_scope(Environment::Development, target)
    }

    /// Dependencies to install for `target`, optionally including development
    /// dependencies.
    ///
    /// Layers are applied in order default prod, default dev, target prod,
    /// target dev; a later layer wins for a shared name. Addons named by a
    /// selected dependency's `replace` are then dropped; two dependencies
    /// replacing the same addon is an error.
    pub fn installable(&self, target: Option<&str>, include_dev: bool) -> Result<Vec<Dependency>> {
        let target_set = match target {
            None => None,
            Some("") => return Err(Error::MissingTarget),
            Some(name) => self.targets.get(name),
        };

        let mut layers = vec![self.root.list(Environment::Production)];
        if include_dev {
            layers.push(self.root.list(Environment::Development));
        }
        if let Some(set) = target_set {
            layers.push(set.list(Environment::Production));
            if include_dev {
                layers.push(set.list(Environment::Development));
            }
        }

        let deps = merge::overlay_all(layers);

        let mut replaced: BTreeMap<String, String> = BTreeMap::new();
        for dep in &deps {
            let Some(name) = dep.spec.replace.as_ref() else {
                continue;
            };
            if let Some(other) = replaced.insert(name.clone(), dep.name.clone()) {
                return Err(Error::invalid_spec(format!(
                    "addon '{}' is replaced by both '{}' and '{}'",
                    name, other, dep.name
                )));
            }
        }

        for (name, by) in &replaced {
            tracing::debug!(%name, %by, "addon replaced");
        }

        Ok(deps
            .into_iter()
            .filter(|dep| !replaced.contains_key(&dep.name))
            .collect())
    }

    /// Check every recorded spec with [`Spec::validate`].
    pub fn validate(&self) -> Result<()> {
        let scopes = std::iter::once(&self.root).chain(self.targets.values());
        for set in scopes {
            for (name, spec) in set.prod.iter().chain(set.dev.iter()) {
                spec.validate()
                    .map_err(|e| Error::invalid_spec(format!("dependency '{}': {}", name, e)))?;
            }
        }

        Ok(())
    }

    fn list_scope(&self, env: Environment, target: &str) -> Vec<Dependency> {
        let layer = self
            .targets
            .get(target)
            .filter(|_| !target.is_empty())
            .map(|set| set.list(env))
            .unwrap_or_default();

        merge::overlay(self.root.list(env), layer)
    }
}

/// Addon names become directory names under `addons/`, so they must be a
/// single plain path component.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0');

    if valid {
        Ok(())
    } else {
        Err(Error::invalid_spec(format!("invalid addon name: '{}'", name)))
    }
}

/// On-disk shape of a [`Manifest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    dependencies: BTreeMap<String, Spec>,

    #[serde(
        rename = "devDependencies",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    dev_dependencies: BTreeMap<String, Spec>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    target: BTreeMap<String, DependencySet>,
}

impl TryFrom<ManifestFile> for Manifest {
    type Error = Error;

    fn try_from(file: ManifestFile) -> Result<Self> {
        let root = DependencySet {
            prod: file.dependencies,
            dev: file.dev_dependencies,
        };

        let scopes = std::iter::once(&root).chain(file.target.values());
        for name in scopes.flat_map(|set| set.prod.keys().chain(set.dev.keys())) {
            validate_name(name)?;
        }

        if let Some((name, _)) = root
            .prod
            .iter()
            .chain(root.dev.iter())
            .find(|(_, spec)| spec.replace.is_some())
        {
            return Err(Error::invalid_spec(format!(
                "'{}' replaces an addon but is not in a target scope",
                name
            )));
        }

        Ok(Self {
            root,
            targets: file.target,
        })
    }
}

impl From<Manifest> for ManifestFile {
    fn from(manifest: Manifest) -> Self {
        Self {
            dependencies: manifest.root.prod,
            dev_dependencies: manifest.root.dev,
            target: manifest
                .targets
                .into_iter()
                .filter(|(_, set)| !set.is_empty())
                .collect(),
        }
    }
}
