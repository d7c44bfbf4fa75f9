//! Production and development dependency buckets for a single scope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Dependency, Environment};
use crate::spec::Spec;

/// A set of named addon dependencies. A name is registered as either a
/// production or a development dependency, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencySet {
    #[serde(
        rename = "dependencies",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub(crate) prod: BTreeMap<String, Spec>,

    #[serde(
        rename = "devDependencies",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub(crate) dev: BTreeMap<String, Spec>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `spec` under `name` for `env`, dropping any entry for `name` in
    /// the other environment. An existing entry in `env` is overwritten.
    pub fn add(&mut self, name: impl Into<String>, spec: Spec, env: Environment) {
        let name = name.into();
        let (add_to, remove_from) = match env {
            Environment::Production => (&mut self.prod, &mut self.dev),
            Environment::Development => (&mut self.dev, &mut self.prod),
        };

        remove_from.remove(&name);
        add_to.insert(name, spec);
    }

    /// All dependencies registered for `env`.
    pub fn list(&self, env: Environment) -> Vec<Dependency> {
        self.bucket(env)
            .iter()
            .map(|(name, spec)| Dependency::new(name.clone(), spec.clone()))
            .collect()
    }

    /// Remove `name` from both environments. Returns whether anything was
    /// removed; removing an absent name is a no-op.
    pub fn remove(&mut self, name: &str) -> bool {
        let prod = self.prod.remove(name).is_some();
        let dev = self.dev.remove(name).is_some();
        prod || dev
    }

    /// Look up `name` in either environment.
    pub fn get(&self, name: &str) -> Option<(Environment, &Spec)> {
        self.prod
            .get(name)
            .map(|spec| (Environment::Production, spec))
            .or_else(|| {
                self.dev
                    .get(name)
                    .map(|spec| (Environment::Development, spec))
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.prod.len() + self.dev.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prod.is_empty() && self.dev.is_empty()
    }

    fn bucket(&self, env: Environment) -> &BTreeMap<String, Spec> {
        match env {
            Environment::Production => &self.prod,
            Environment::Development => &self.dev,
        }
    }
}
