//! In-memory state store for tests

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::{StateStore, StoredInstance};
use crate::error::Result;

/// In-memory state store
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    store: Arc<RwLock<BTreeMap<String, StoredInstance>>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub lists: usize,
    pub puts: usize,
    pub removes: usize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instances(instances: Vec<StoredInstance>) -> Self {
        let store = Self::new();
        {
            let mut map = store.store.write().unwrap();
            for instance in instances {
                map.insert(instance.address(), instance);
            }
        }
        store
    }

    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    pub fn reset_counts(&self) {
        *self.operations.write().unwrap() = OperationCounts::default();
    }

    /// Addresses currently stored
    pub fn addresses(&self) -> Vec<String> {
        self.store.read().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.store.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, address: &str) -> Result<Option<StoredInstance>> {
        self.operations.write().unwrap().gets += 1;
        Ok(self.store.read().unwrap().get(address).cloned())
    }

    async fn list(&self) -> Result<Vec<StoredInstance>> {
        self.operations.write().unwrap().lists += 1;
        Ok(self.store.read().unwrap().values().cloned().collect())
    }

    async fn put(&self, instance: StoredInstance) -> Result<()> {
        self.operations.write().unwrap().puts += 1;
        self.store.write().unwrap().insert(instance.address(), instance);
        Ok(())
    }

    async fn remove(&self, address: &str) -> Result<Option<StoredInstance>> {
        self.operations.write().unwrap().removes += 1;
        Ok(self.store.write().unwrap().remove(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_counts_operations() {
        let store = MemoryStateStore::with_instances(vec![StoredInstance::new(
            "aws_codecommit_repository",
            "main",
            "repo",
            0,
            json!({}),
        )]);

        assert!(store.exists("aws_codecommit_repository.main").await.unwrap());
        store.remove("aws_codecommit_repository.main").await.unwrap();
        assert!(store.is_empty());

        let counts = store.operation_counts();
        assert_eq!(counts.gets, 1);
        assert_eq!(counts.removes, 1);

        store.reset_counts();
        assert_eq!(store.operation_counts(), OperationCounts::default());
    }
}
