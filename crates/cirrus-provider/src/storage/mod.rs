//! Storage drivers for persisting resource state
//!
//! - **File** (default): one JSON document holding every instance
//! - **Memory**: in-process map for tests
//!
//! Instances are addressed as `<type>.<name>`, e.g.
//! `aws_codecommit_repository.main`.

mod file;
mod memory;

pub use file::{DEFAULT_STATE_FILE, FileStateStore};
pub use memory::{MemoryStateStore, OperationCounts};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Persisted state of one resource instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInstance {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Remote identifier
    pub id: String,
    #[serde(default)]
    pub schema_version: i64,
    /// Full state document as written by the resource handler
    pub attributes: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredInstance {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        id: impl Into<String>,
        schema_version: i64,
        attributes: JsonValue,
    ) -> Self {
        let now = Utc::now();
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            id: id.into(),
            schema_version,
            attributes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn address(&self) -> String {
        address(&self.resource_type, &self.name)
    }

    /// Replace the state document, keeping the creation time
    pub fn updated(mut self, id: impl Into<String>, attributes: JsonValue) -> Self {
        self.id = id.into();
        self.attributes = attributes;
        self.updated_at = Utc::now();
        self
    }
}

/// Address of an instance
pub fn address(resource_type: &str, name: &str) -> String {
    format!("{}.{}", resource_type, name)
}

/// Split `<type>.<name>` into its parts
pub fn parse_address(address: &str) -> Option<(&str, &str)> {
    address
        .split_once('.')
        .filter(|(t, n)| !t.is_empty() && !n.is_empty())
}

/// State persistence backend
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, address: &str) -> Result<Option<StoredInstance>>;

    /// All instances, ordered by address
    async fn list(&self) -> Result<Vec<StoredInstance>>;

    /// Insert or replace an instance
    async fn put(&self, instance: StoredInstance) -> Result<()>;

    /// Remove an instance, returning it when present
    async fn remove(&self, address: &str) -> Result<Option<StoredInstance>>;

    async fn exists(&self, address: &str) -> Result<bool> {
        Ok(self.get(address).await?.is_some())
    }
}
