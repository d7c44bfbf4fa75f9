//! Overlay merging of dependency layers.
//!
//! A target scope is layered over the default scope: entries in the upper
//! layer replace lower-layer entries with the same name, and names unique to
//! either layer are kept.

use std::collections::BTreeMap;

use super::Dependency;

/// Merge `layer` over `base` by dependency name.
pub fn overlay(base: Vec<Dependency>, layer: Vec<Dependency>) -> Vec<Dependency> {
    overlay_all([base, layer])
}

/// Merge any number of layers, lowest precedence first.
///
/// The result is sorted by name; callers should not rely on that order.
pub fn overlay_all<I>(layers: I) -> Vec<Dependency>
where
    I: IntoIterator<Item = Vec<Dependency>>,
{
    let mut merged: BTreeMap<String, Dependency> = BTreeMap::new();

    for layer in layers {
        for dep in layer {
            merged.insert(dep.name.clone(), dep);
        }
    }

    merged.into_values().collect()
}
