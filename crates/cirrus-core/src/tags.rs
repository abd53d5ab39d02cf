//! Key/value tag sets
//!
//! Tag handling follows three rules:
//! - provider default tags merge under resource tags (resource values win)
//! - system tags (`aws:` prefix) and configured ignore keys/prefixes are never managed
//! - updates remove stale keys before writing new or changed ones

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Prefix reserved for tags set by the cloud provider itself
pub const SYSTEM_TAG_PREFIX: &str = "aws:";

/// Tags that the provider must neither read back nor modify
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default)]
    pub keys: BTreeSet<String>,
    #[serde(default)]
    pub key_prefixes: Vec<String>,
}

impl IgnoreConfig {
    pub fn is_ignored(&self, key: &str) -> bool {
        self.keys.contains(key) || self.key_prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }
}

/// An ordered set of tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValueTags(BTreeMap<String, String>);

impl KeyValueTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }

    /// Union of both sets; values from `other` win
    pub fn merge(&self, other: &KeyValueTags) -> KeyValueTags {
        let mut merged = self.0.clone();
        merged.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(merged)
    }

    /// Drop system tags
    pub fn ignore_system(&self) -> KeyValueTags {
        self.filter(|key, _| !key.starts_with(SYSTEM_TAG_PREFIX))
    }

    /// Drop tags matching the ignore configuration
    pub fn ignore(&self, config: &IgnoreConfig) -> KeyValueTags {
        self.filter(|key, _| !config.is_ignored(key))
    }

    /// Keys present here but absent from `new`
    pub fn removed(&self, new: &KeyValueTags) -> KeyValueTags {
        self.filter(|key, _| !new.contains_key(key))
    }

    /// Entries of `new` that are absent here or carry a different value
    pub fn updated(&self, new: &KeyValueTags) -> KeyValueTags {
        new.filter(|key, value| self.get(key) != Some(value))
    }

    /// Strip entries that come only from matching provider defaults
    ///
    /// Keys the resource configures explicitly are kept even when their value
    /// equals the default.
    pub fn remove_defaults(&self, defaults: &KeyValueTags, configured: &KeyValueTags) -> KeyValueTags {
        self.filter(|key, value| configured.contains_key(key) || defaults.get(key) != Some(value))
    }

    fn filter(&self, keep: impl Fn(&str, &str) -> bool) -> KeyValueTags {
        Self(
            self.0
                .iter()
                .filter(|(k, v)| keep(k, v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for KeyValueTags {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueTags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> KeyValueTags {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_merge_prefers_resource_values() {
        let defaults = tags(&[("env", "prod"), ("owner", "platform")]);
        let resource = tags(&[("env", "dev"), ("k1", "v1")]);

        let all = defaults.merge(&resource);
        assert_eq!(all, tags(&[("env", "dev"), ("k1", "v1"), ("owner", "platform")]));
    }

    #[test]
    fn test_removed_and_updated() {
        let old = tags(&[("k1", "v1")]);
        let new = tags(&[("k1", "v1updated"), ("k2", "v2")]);

        assert!(old.removed(&new).is_empty());
        assert_eq!(old.updated(&new), new);

        let after = tags(&[("k2", "v2")]);
        assert_eq!(new.removed(&after).keys(), vec!["k1"]);
        assert!(new.updated(&after).is_empty());
    }

    #[test]
    fn test_ignore_rules() {
        let remote = tags(&[
            ("aws:cloudformation:stack-name", "stack"),
            ("k1", "v1"),
            ("managed-by", "scanner"),
            ("temp-id", "42"),
        ]);

        let config = IgnoreConfig {
            keys: ["managed-by".to_string()].into_iter().collect(),
            key_prefixes: vec!["temp-".to_string()],
        };

        assert_eq!(remote.ignore_system().ignore(&config), tags(&[("k1", "v1")]));
    }

    #[test]
    fn test_remove_defaults_keeps_configured_keys() {
        let defaults = tags(&[("env", "prod"), ("owner", "platform")]);
        let configured = tags(&[("owner", "platform"), ("k1", "v1")]);
        let all = tags(&[("env", "prod"), ("k1", "v1"), ("owner", "platform")]);

        assert_eq!(
            all.remove_defaults(&defaults, &configured),
            tags(&[("k1", "v1"), ("owner", "platform")])
        );
    }
}
