//! Resource tagging operations shared by all services

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::Result;

/// Tag operations keyed by resource ARN
#[async_trait]
pub trait ResourceTagger: Send + Sync {
    async fn list_tags(&self, resource_arn: &str) -> Result<BTreeMap<String, String>>;

    async fn tag_resource(&self, resource_arn: &str, tags: BTreeMap<String, String>) -> Result<()>;

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<()>;
}
