//! HTTP implementation of the CodeCommit API

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use super::types::*;
use super::CodeCommitApi;
use crate::config::{CODECOMMIT, ClientConfig};
use crate::error::Result;
use crate::tagging::ResourceTagger;
use crate::transport::{Empty, HttpTransport};

const TARGET_PREFIX: &str = "CodeCommit_20150413";

/// Signed CodeCommit client
#[derive(Debug, Clone)]
pub struct CodeCommitClient {
    transport: HttpTransport,
}

impl CodeCommitClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config, CODECOMMIT)?,
        })
    }

    async fn call<I, O>(&self, operation: &str, input: &I) -> Result<O>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        self.transport.call_json(TARGET_PREFIX, operation, input).await
    }
}

#[async_trait]
impl CodeCommitApi for CodeCommitClient {
    async fn create_repository(&self, input: CreateRepositoryInput) -> Result<CreateRepositoryOutput> {
        self.call("CreateRepository", &input).await
    }

    async fn get_repository(&self, input: GetRepositoryInput) -> Result<GetRepositoryOutput> {
        self.call("GetRepository", &input).await
    }

    async fn delete_repository(&self, input: DeleteRepositoryInput) -> Result<DeleteRepositoryOutput> {
        self.call("DeleteRepository", &input).await
    }

    async fn update_repository_name(&self, input: UpdateRepositoryNameInput) -> Result<()> {
        self.call::<_, Empty>("UpdateRepositoryName", &input).await?;
        Ok(())
    }

    async fn update_repository_description(&self, input: UpdateRepositoryDescriptionInput) -> Result<()> {
        self.call::<_, Empty>("UpdateRepositoryDescription", &input).await?;
        Ok(())
    }

    async fn update_default_branch(&self, input: UpdateDefaultBranchInput) -> Result<()> {
        self.call::<_, Empty>("UpdateDefaultBranch", &input).await?;
        Ok(())
    }

    async fn update_repository_encryption_key(
        &self,
        input: UpdateRepositoryEncryptionKeyInput,
    ) -> Result<UpdateRepositoryEncryptionKeyOutput> {
        self.call("UpdateRepositoryEncryptionKey", &input).await
    }

    async fn list_branches(&self, input: ListBranchesInput) -> Result<ListBranchesOutput> {
        self.call("ListBranches", &input).await
    }
}

#[async_trait]
impl ResourceTagger for CodeCommitClient {
    async fn list_tags(&self, resource_arn: &str) -> Result<BTreeMap<String, String>> {
        let mut tags = BTreeMap::new();
        let mut next_token = None;

        loop {
            let input = ListTagsForResourceInput {
                resource_arn: resource_arn.to_string(),
                next_token,
            };
            let page: ListTagsForResourceOutput = self.call("ListTagsForResource", &input).await?;
            tags.extend(page.tags);

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => return Ok(tags),
            }
        }
    }

    async fn tag_resource(&self, resource_arn: &str, tags: BTreeMap<String, String>) -> Result<()> {
        let input = TagResourceInput {
            resource_arn: resource_arn.to_string(),
            tags,
        };
        self.call::<_, Empty>("TagResource", &input).await?;
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<()> {
        let input = UntagResourceInput {
            resource_arn: resource_arn.to_string(),
            tag_keys,
        };
        self.call::<_, Empty>("UntagResource", &input).await?;
        Ok(())
    }
}
