//! In-memory Bedrock Agent for tests
//!
//! Knowledge bases move through the service's asynchronous statuses:
//! `CREATING` and `UPDATING` settle to `ACTIVE` (or `FAILED`), `DELETING`
//! settles to gone, each after a configurable number of reads.

use async_trait::async_trait;
use chrono::Utc;
use cirrus_core::Arn;
use rand::Rng;
use rand::distr::Alphanumeric;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::error_codes::*;
use super::types::*;
use super::BedrockAgentApi;
use crate::error::{ApiError, ClientError, Result};
use crate::tagging::ResourceTagger;

#[derive(Debug, Clone)]
struct MockKnowledgeBase {
    knowledge_base: KnowledgeBase,
    tags: BTreeMap<String, String>,
    /// Reads left before the current transitional status settles
    reads_until_settled: u32,
    failure_reasons: Vec<String>,
}

#[derive(Debug)]
struct MockState {
    region: String,
    account_id: String,
    knowledge_bases: BTreeMap<String, MockKnowledgeBase>,
    client_tokens: BTreeMap<String, String>,
    calls: Vec<String>,
    failures: BTreeMap<String, ApiError>,
    settle_after: u32,
    next_failure_reasons: Option<Vec<String>>,
}

/// In-memory Bedrock Agent
#[derive(Debug, Clone)]
pub struct MockBedrockAgent {
    state: Arc<RwLock<MockState>>,
}

impl Default for MockBedrockAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBedrockAgent {
    pub fn new() -> Self {
        Self::with_account("us-west-2", "123456789012")
    }

    pub fn with_account(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState {
                region: region.into(),
                account_id: account_id.into(),
                knowledge_bases: BTreeMap::new(),
                client_tokens: BTreeMap::new(),
                calls: Vec::new(),
                failures: BTreeMap::new(),
                settle_after: 1,
                next_failure_reasons: None,
            })),
        }
    }

    /// Number of reads a transitional status survives (default 1)
    pub fn set_settle_after(&self, reads: u32) {
        self.state.write().unwrap().settle_after = reads;
    }

    /// The next created knowledge base ends in `FAILED` with these reasons
    pub fn fail_next_creation(&self, reasons: &[&str]) {
        self.state.write().unwrap().next_failure_reasons =
            Some(reasons.iter().map(|r| r.to_string()).collect());
    }

    /// Fail the next invocation of `operation` with `error`
    pub fn fail_next(&self, operation: &str, error: ApiError) {
        self.state
            .write()
            .unwrap()
            .failures
            .insert(operation.to_string(), error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.read().unwrap().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.as_str() == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.write().unwrap().calls.clear();
    }

    /// Current stored knowledge base, without advancing its status
    pub fn knowledge_base(&self, id: &str) -> Option<KnowledgeBase> {
        self.state
            .read()
            .unwrap()
            .knowledge_bases
            .get(id)
            .map(|kb| kb.knowledge_base.clone())
    }

    pub fn knowledge_base_tags(&self, id: &str) -> Option<BTreeMap<String, String>> {
        self.state
            .read()
            .unwrap()
            .knowledge_bases
            .get(id)
            .map(|kb| kb.tags.clone())
    }

    pub fn ids(&self) -> Vec<String> {
        self.state.read().unwrap().knowledge_bases.keys().cloned().collect()
    }

    /// Delete a knowledge base behind the provider's back
    pub fn delete_out_of_band(&self, id: &str) -> bool {
        self.state.write().unwrap().knowledge_bases.remove(id).is_some()
    }

    /// Change a description behind the provider's back
    pub fn set_description_out_of_band(&self, id: &str, description: Option<&str>) {
        let mut state = self.state.write().unwrap();
        if let Some(kb) = state.knowledge_bases.get_mut(id) {
            kb.knowledge_base.description = description.map(str::to_string);
        }
    }

    fn record(&self, operation: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.push(operation.to_string());
        match state.failures.remove(operation) {
            Some(error) => Err(ClientError::Api(error)),
            None => Ok(()),
        }
    }
}

impl MockState {
    fn knowledge_base_mut(&mut self, id: &str) -> Result<&mut MockKnowledgeBase> {
        self.knowledge_bases.get_mut(id).ok_or_else(|| not_found(id))
    }

    fn by_arn_mut(&mut self, arn: &str) -> Result<&mut MockKnowledgeBase> {
        self.knowledge_bases
            .values_mut()
            .find(|kb| kb.knowledge_base.knowledge_base_arn == arn)
            .ok_or_else(|| {
                ClientError::Api(
                    ApiError::new(RESOURCE_NOT_FOUND, format!("Resource {} not found", arn)).with_status(404),
                )
            })
    }

    /// Advance the transitional status of `id` by one read
    fn advance(&mut self, id: &str) {
        let Some(entry) = self.knowledge_bases.get_mut(id) else {
            return;
        };

        let status = entry.knowledge_base.status;
        let transitional = matches!(
            status,
            KnowledgeBaseStatus::Creating | KnowledgeBaseStatus::Updating | KnowledgeBaseStatus::Deleting
        );
        if !transitional {
            return;
        }

        entry.reads_until_settled = entry.reads_until_settled.saturating_sub(1);
        if entry.reads_until_settled > 0 {
            return;
        }

        match status {
            KnowledgeBaseStatus::Deleting => {
                self.knowledge_bases.remove(id);
            }
            _ if !entry.failure_reasons.is_empty() => {
                entry.knowledge_base.status = KnowledgeBaseStatus::Failed;
                entry.knowledge_base.failure_reasons = entry.failure_reasons.clone();
                entry.knowledge_base.updated_at = Utc::now();
            }
            _ => {
                entry.knowledge_base.status = KnowledgeBaseStatus::Active;
                entry.knowledge_base.updated_at = Utc::now();
            }
        }
    }
}

fn not_found(id: &str) -> ClientError {
    ClientError::Api(
        ApiError::new(RESOURCE_NOT_FOUND, format!("Knowledge base {} not found", id)).with_status(404),
    )
}

fn validate_storage(storage: Option<&StorageConfiguration>) -> Result<()> {
    let Some(storage) = storage else {
        return Ok(());
    };

    let present = match storage.kind.as_str() {
        "OPENSEARCH_SERVERLESS" => storage.opensearch_serverless_configuration.is_some(),
        "PINECONE" => storage.pinecone_configuration.is_some(),
        "RDS" => storage.rds_configuration.is_some(),
        "REDIS_ENTERPRISE_CLOUD" => storage.redis_enterprise_cloud_configuration.is_some(),
        other => {
            return Err(ClientError::api(
                VALIDATION,
                format!("Unsupported storage type {}", other),
            ));
        }
    };

    if present {
        Ok(())
    } else {
        Err(ClientError::api(
            VALIDATION,
            format!("Storage configuration for type {} is missing", storage.kind),
        ))
    }
}

fn random_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}

#[async_trait]
impl BedrockAgentApi for MockBedrockAgent {
    async fn create_knowledge_base(&self, input: CreateKnowledgeBaseInput) -> Result<CreateKnowledgeBaseOutput> {
        self.record("CreateKnowledgeBase")?;
        validate_storage(input.storage_configuration.as_ref())?;
        let mut state = self.state.write().unwrap();

        if let Some(existing) = input
            .client_token
            .as_ref()
            .and_then(|token| state.client_tokens.get(token))
            .and_then(|id| state.knowledge_bases.get(id))
        {
            return Ok(CreateKnowledgeBaseOutput {
                knowledge_base: existing.knowledge_base.clone(),
            });
        }

        let id = random_id();
        let arn = Arn::new(
            "aws",
            "bedrock",
            &state.region,
            &state.account_id,
            format!("knowledge-base/{}", id),
        );
        let now = Utc::now();
        let knowledge_base = KnowledgeBase {
            knowledge_base_id: id.clone(),
            knowledge_base_arn: arn.to_string(),
            name: input.name,
            description: input.description,
            role_arn: input.role_arn,
            knowledge_base_configuration: input.knowledge_base_configuration,
            storage_configuration: input.storage_configuration,
            status: KnowledgeBaseStatus::Creating,
            created_at: now,
            updated_at: now,
            failure_reasons: Vec::new(),
        };

        let failure_reasons = state.next_failure_reasons.take().unwrap_or_default();
        let settle_after = state.settle_after;
        if let Some(token) = input.client_token {
            state.client_tokens.insert(token, id.clone());
        }
        state.knowledge_bases.insert(
            id,
            MockKnowledgeBase {
                knowledge_base: knowledge_base.clone(),
                tags: input.tags,
                reads_until_settled: settle_after,
                failure_reasons,
            },
        );

        Ok(CreateKnowledgeBaseOutput { knowledge_base })
    }

    async fn get_knowledge_base(&self, knowledge_base_id: &str) -> Result<GetKnowledgeBaseOutput> {
        self.record("GetKnowledgeBase")?;
        let mut state = self.state.write().unwrap();
        state.advance(knowledge_base_id);
        let entry = state.knowledge_base_mut(knowledge_base_id)?;
        Ok(GetKnowledgeBaseOutput {
            knowledge_base: entry.knowledge_base.clone(),
        })
    }

    async fn update_knowledge_base(&self, input: UpdateKnowledgeBaseInput) -> Result<UpdateKnowledgeBaseOutput> {
        self.record("UpdateKnowledgeBase")?;
        validate_storage(input.storage_configuration.as_ref())?;
        let mut state = self.state.write().unwrap();
        let settle_after = state.settle_after;
        let entry = state.knowledge_base_mut(&input.knowledge_base_id)?;

        if entry.knowledge_base.status != KnowledgeBaseStatus::Active {
            return Err(ClientError::api(
                CONFLICT,
                format!(
                    "Knowledge base {} is in status {}",
                    input.knowledge_base_id, entry.knowledge_base.status
                ),
            ));
        }

        let kb = &mut entry.knowledge_base;
        kb.name = input.name;
        kb.description = input.description;
        kb.role_arn = input.role_arn;
        kb.knowledge_base_configuration = input.knowledge_base_configuration;
        kb.storage_configuration = input.storage_configuration;
        kb.status = KnowledgeBaseStatus::Updating;
        kb.updated_at = Utc::now();
        entry.reads_until_settled = settle_after;

        Ok(UpdateKnowledgeBaseOutput {
            knowledge_base: entry.knowledge_base.clone(),
        })
    }

    async fn delete_knowledge_base(&self, knowledge_base_id: &str) -> Result<DeleteKnowledgeBaseOutput> {
        self.record("DeleteKnowledgeBase")?;
        let mut state = self.state.write().unwrap();
        let settle_after = state.settle_after;
        let entry = state.knowledge_base_mut(knowledge_base_id)?;

        entry.knowledge_base.status = KnowledgeBaseStatus::Deleting;
        entry.reads_until_settled = settle_after;

        Ok(DeleteKnowledgeBaseOutput {
            knowledge_base_id: knowledge_base_id.to_string(),
            status: KnowledgeBaseStatus::Deleting,
        })
    }
}

#[async_trait]
impl ResourceTagger for MockBedrockAgent {
    async fn list_tags(&self, resource_arn: &str) -> Result<BTreeMap<String, String>> {
        self.record("ListTagsForResource")?;
        let mut state = self.state.write().unwrap();
        Ok(state.by_arn_mut(resource_arn)?.tags.clone())
    }

    async fn tag_resource(&self, resource_arn: &str, tags: BTreeMap<String, String>) -> Result<()> {
        self.record("TagResource")?;
        let mut state = self.state.write().unwrap();
        state.by_arn_mut(resource_arn)?.tags.extend(tags);
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<()> {
        self.record("UntagResource")?;
        let mut state = self.state.write().unwrap();
        let entry = state.by_arn_mut(resource_arn)?;
        for key in tag_keys {
            entry.tags.remove(&key);
        }
        Ok(())
    }
}
