//! Flattened attribute view of configurations and states
//!
//! Resource configurations and states are typed structs, but change detection,
//! plan rendering and test assertions all work on a flat `key -> string` map:
//! - `repository_name` for top-level scalars
//! - `storage_configuration.#` and `storage_configuration.0.type` for blocks and lists
//! - `tags.%` and `tags.env` for maps
//!
//! Null values, empty lists and empty maps are treated as absent.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::Result;

/// Flattened attributes, sorted by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeMap(BTreeMap<String, String>);

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten any serializable value whose root is an object
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_value(value)?;
        Ok(Self::from_json(&json))
    }

    /// Flatten a JSON object. Non-object roots yield an empty map.
    pub fn from_json(value: &JsonValue) -> Self {
        let mut map = BTreeMap::new();
        if let JsonValue::Object(fields) = value {
            flatten_block(&mut map, "", fields);
        }
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Names of the top-level attributes present in the map
    pub fn top_level_names(&self) -> BTreeSet<&str> {
        self.0.keys().map(|k| top_level_name(k)).collect()
    }

    /// All entries belonging to the top-level attribute `name`
    pub fn attribute(&self, name: &str) -> AttributeMap {
        let nested = format!("{}.", name);
        Self(
            self.0
                .iter()
                .filter(|(k, _)| k.as_str() == name || k.starts_with(&nested))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Keyed differences between `self` (old) and `new`
    pub fn diff(&self, new: &AttributeMap) -> Vec<AttributeChange> {
        let keys: BTreeSet<&String> = self.0.keys().chain(new.0.keys()).collect();

        keys.into_iter()
            .filter_map(|key| {
                let old = self.0.get(key);
                let updated = new.0.get(key);
                (old != updated).then(|| AttributeChange {
                    path: key.clone(),
                    old: old.cloned(),
                    new: updated.cloned(),
                })
            })
            .collect()
    }
}

impl FromIterator<(String, String)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// First path segment of a flattened key
pub fn top_level_name(key: &str) -> &str {
    key.split('.').next().unwrap_or(key)
}

/// A single flattened key whose value differs between two maps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeChange {
    pub path: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl AttributeChange {
    /// Top-level attribute this change belongs to
    pub fn attribute(&self) -> &str {
        top_level_name(&self.path)
    }

    pub fn is_addition(&self) -> bool {
        self.old.is_none() && self.new.is_some()
    }

    pub fn is_removal(&self) -> bool {
        self.old.is_some() && self.new.is_none()
    }
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.old, &self.new) {
            (None, Some(new)) => write!(f, "+ {}: {:?}", self.path, new),
            (Some(old), None) => write!(f, "- {}: {:?}", self.path, old),
            (Some(old), Some(new)) => write!(f, "~ {}: {:?} -> {:?}", self.path, old, new),
            (None, None) => write!(f, "  {}", self.path),
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn flatten_block(map: &mut BTreeMap<String, String>, prefix: &str, fields: &Map<String, JsonValue>) {
    for (name, value) in fields {
        flatten_value(map, join(prefix, name), value);
    }
}

fn flatten_value(map: &mut BTreeMap<String, String>, key: String, value: &JsonValue) {
    match value {
        JsonValue::Null => {}
        JsonValue::Bool(b) => {
            map.insert(key, b.to_string());
        }
        JsonValue::Number(n) => {
            map.insert(key, n.to_string());
        }
        JsonValue::String(s) => {
            map.insert(key, s.clone());
        }
        JsonValue::Array(items) => {
            if items.is_empty() {
                return;
            }
            map.insert(format!("{}.#", key), items.len().to_string());
            for (index, item) in items.iter().enumerate() {
                let item_key = join(&key, &index.to_string());
                match item {
                    // list elements that are objects are nested blocks
                    JsonValue::Object(fields) => flatten_block(map, &item_key, fields),
                    other => flatten_value(map, item_key, other),
                }
            }
        }
        JsonValue::Object(entries) => {
            let present: Vec<_> = entries.iter().filter(|(_, v)| !v.is_null()).collect();
            if present.is_empty() {
                return;
            }
            map.insert(format!("{}.%", key), present.len().to_string());
            for (name, entry) in present {
                flatten_value(map, join(&key, name), entry);
            }
        }
    }
}
