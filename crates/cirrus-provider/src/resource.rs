//! Typed resource handler contract
//!
//! Each resource type implements [`ResourceHandler`] over its own
//! configuration and state structs. The registry only ever sees the
//! type-erased [`DynResource`](crate::dynamic::DynResource) wrapper.

use async_trait::async_trait;
use cirrus_core::{ChangeSet, Schema, ValidationErrorInfo};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// State record persisted for one resource instance
pub trait ResourceState: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Remote identifier of the instance
    fn id(&self) -> &str;
}

/// CRUD handler for one resource type
///
/// `read` returns [`ProviderError::NotFound`](crate::error::ProviderError::NotFound)
/// when the remote object is gone; callers decide whether that drops state
/// or is an error.
#[async_trait]
pub trait ResourceHandler: Send + Sync + 'static {
    type Config: Serialize + DeserializeOwned + Send + Sync + 'static;
    type State: ResourceState;

    /// Type name used in configuration files, e.g. `aws_codecommit_repository`
    const TYPE_NAME: &'static str;

    /// Human readable name used in messages, e.g. `CodeCommit Repository`
    const DISPLAY_NAME: &'static str;

    fn schema() -> Schema;

    /// Checks that span several attributes
    fn validate(&self, _config: &Self::Config) -> Vec<ValidationErrorInfo> {
        Vec::new()
    }

    async fn create(&self, config: &Self::Config) -> Result<Self::State>;

    /// Read the remote object; `prior` carries configured values that the
    /// remote side does not echo back
    async fn read(&self, id: &str, prior: Option<&Self::State>) -> Result<Self::State>;

    async fn update(&self, prior: &Self::State, config: &Self::Config, changes: &ChangeSet) -> Result<Self::State>;

    /// State to record when a failed update had already moved the
    /// identifier to `id`; `None` for resources whose identifier never moves
    fn moved(&self, _prior: &Self::State, _id: &str) -> Result<Option<Self::State>> {
        Ok(None)
    }

    async fn delete(&self, state: &Self::State) -> Result<()>;

    async fn import(&self, id: &str) -> Result<Self::State> {
        self.read(id, None).await
    }
}
