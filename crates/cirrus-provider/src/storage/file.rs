//! File-based state store
//!
//! Keeps every instance in one JSON document. Each write bumps a serial
//! number and replaces the file through a temporary sibling, so a crash
//! mid-write leaves the previous state intact.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use super::{StateStore, StoredInstance};
use crate::error::{ProviderError, Result};

/// State file used when none is given
pub const DEFAULT_STATE_FILE: &str = "cirrus.state.json";

const STATE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDocument {
    version: u32,
    serial: u64,
    #[serde(default)]
    instances: BTreeMap<String, StoredInstance>,
}

/// JSON file state store
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serial of the last write, 0 when the file does not exist yet
    pub fn serial(&self) -> Result<u64> {
        Ok(self.read_document()?.serial)
    }

    fn read_document(&self) -> Result<StateDocument> {
        if !self.path.exists() {
            return Ok(StateDocument {
                version: STATE_FORMAT_VERSION,
                ..Default::default()
            });
        }

        let data = std::fs::read(&self.path)?;
        let document: StateDocument = serde_json::from_slice(&data).map_err(|e| {
            ProviderError::State(format!("cannot parse {}: {}", self.path.display(), e))
        })?;

        if document.version > STATE_FORMAT_VERSION {
            return Err(ProviderError::State(format!(
                "{} uses state format {}, this build understands up to {}",
                self.path.display(),
                document.version,
                STATE_FORMAT_VERSION
            )));
        }
        Ok(document)
    }

    fn write_document(&self, mut document: StateDocument) -> Result<()> {
        document.version = STATE_FORMAT_VERSION;
        document.serial += 1;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec_pretty(&document)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), serial = document.serial, "wrote state");
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut StateDocument) -> T) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ProviderError::State("state lock poisoned".to_string()))?;
        let mut document = self.read_document()?;
        let out = f(&mut document);
        self.write_document(document)?;
        Ok(out)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, address: &str) -> Result<Option<StoredInstance>> {
        Ok(self.read_document()?.instances.remove(address))
    }

    async fn list(&self) -> Result<Vec<StoredInstance>> {
        Ok(self.read_document()?.instances.into_values().collect())
    }

    async fn put(&self, instance: StoredInstance) -> Result<()> {
        self.modify(|doc| {
            doc.instances.insert(instance.address(), instance);
        })
    }

    async fn remove(&self, address: &str) -> Result<Option<StoredInstance>> {
        self.modify(|doc| doc.instances.remove(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn instance(name: &str, id: &str) -> StoredInstance {
        StoredInstance::new("aws_codecommit_repository", name, id, 0, json!({ "id": id }))
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));

        assert!(store.get("aws_codecommit_repository.a").await.unwrap().is_none());
        assert_eq!(store.serial().unwrap(), 0);

        store.put(instance("a", "repo-a")).await.unwrap();
        store.put(instance("b", "repo-b")).await.unwrap();
        assert_eq!(store.serial().unwrap(), 2);

        let found = store.get("aws_codecommit_repository.a").await.unwrap().unwrap();
        assert_eq!(found.id, "repo-a");
        assert!(store.exists("aws_codecommit_repository.b").await.unwrap());

        let removed = store.remove("aws_codecommit_repository.a").await.unwrap();
        assert_eq!(removed.map(|i| i.id).as_deref(), Some("repo-a"));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        FileStateStore::new(&path).put(instance("a", "repo-a")).await.unwrap();

        let reopened = FileStateStore::new(&path);
        let all = reopened.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].attributes, json!({ "id": "repo-a" }));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStateStore::new(&path).list().await.unwrap_err();
        assert!(matches!(err, ProviderError::State(_)));
    }
}
