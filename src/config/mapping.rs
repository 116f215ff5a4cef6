//! Name-keyed plugin path registry
//!
//! A `PluginMapping` binds plugin names to executable paths for one plugin
//! category. Bindings are never replaced once made, and enumeration follows
//! insertion order rather than hash order.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginMapping {
    /// Bindings in insertion order
    entries: Vec<(String, PathBuf)>,

    /// Name -> position in `entries`
    index: HashMap<String, usize>,
}

impl PluginMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is bound
    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Path bound to `name`, if any
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].1.as_path())
    }

    /// Bind `name` to `path` unless `name` is already bound.
    ///
    /// Returns `true` if the binding was inserted. An existing binding is
    /// left untouched and `false` is returned.
    pub fn set_if_absent(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> bool {
        let name = name.into();
        if self.index.contains_key(&name) {
            return false;
        }

        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, path.into()));
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate bindings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    /// Bound names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    // Decode-time binding: a repeated key in one JSON object keeps the last
    // value, matching plain JSON unmarshalling, at the first key's position.
    fn bind_decoded(&mut self, name: String, path: PathBuf) {
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = path,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, path));
            }
        }
    }
}

impl<N, P> FromIterator<(N, P)> for PluginMapping
where
    N: Into<String>,
    P: Into<PathBuf>,
{
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (name, path) in iter {
            mapping.set_if_absent(name, path);
        }
        mapping
    }
}

impl Serialize for PluginMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, path) in &self.entries {
            map.serialize_entry(name, path)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PluginMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = PluginMapping;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping plugin names to paths")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut mapping = PluginMapping::new();
                while let Some((name, path)) = access.next_entry::<String, PathBuf>()? {
                    mapping.bind_decoded(name, path);
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

/// Accept `null` for a mapping field and treat it as empty
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<PluginMapping, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<PluginMapping>::deserialize(deserializer)?.unwrap_or_default())
}
