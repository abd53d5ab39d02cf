//! `aws_bedrockagent_knowledge_base`
//!
//! Knowledge bases are created, updated and deleted asynchronously: every
//! mutating call is followed by a status wait. The embedding and storage
//! configuration cannot change in place and force replacement.

use async_trait::async_trait;
use cirrus_client::bedrockagent::{
    CreateKnowledgeBaseInput, KnowledgeBase, UpdateKnowledgeBaseInput, error_codes,
};
use cirrus_client::BedrockAgentApi;
use cirrus_core::names::{
    ATTR_ARN, ATTR_CREATED_AT, ATTR_DESCRIPTION, ATTR_FAILURE_REASONS, ATTR_ID, ATTR_NAME,
    ATTR_ROLE_ARN, ATTR_TAGS, ATTR_TAGS_ALL, ATTR_TIMEOUTS, ATTR_UPDATED_AT,
};
use cirrus_core::serde_ext::{optional_block, required_block};
use cirrus_core::{
    Arn, Attribute, Block, ChangeSet, KeyValueTags, NestedBlock, Schema, Timeouts,
    ValidationErrorInfo, Validator,
};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::blocks::{
    KNOWLEDGE_BASE_TYPE_VECTOR, KnowledgeBaseConfigurationBlock, StorageConfigurationBlock,
    knowledge_base_configuration_schema, storage_configuration_schema,
};
use super::find::find_knowledge_base_by_id;
use super::wait::{wait_knowledge_base_created, wait_knowledge_base_deleted, wait_knowledge_base_updated};
use crate::conns::{Clients, TagsContext, WaitSettings};
use crate::error::{ErrAction, ProviderError, Result};
use crate::resource::{ResourceHandler, ResourceState};
use crate::tags::{desired_tags_all, read_tags, update_tags};

pub const RESOURCE_NAME: &str = "Bedrock Agent Knowledge Base";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const NAME_PATTERN: &str = r"^([0-9a-zA-Z][_-]?){1,100}$";

const ATTR_KNOWLEDGE_BASE_CONFIGURATION: &str = "knowledge_base_configuration";
const ATTR_STORAGE_CONFIGURATION: &str = "storage_configuration";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub role_arn: String,
    #[serde(with = "required_block")]
    pub knowledge_base_configuration: KnowledgeBaseConfigurationBlock,
    #[serde(with = "required_block")]
    pub storage_configuration: StorageConfigurationBlock,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<Timeouts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseState {
    pub id: String,
    pub arn: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub role_arn: String,
    #[serde(with = "required_block")]
    pub knowledge_base_configuration: KnowledgeBaseConfigurationBlock,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub storage_configuration: Option<StorageConfigurationBlock>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_reasons: Vec<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub tags_all: BTreeMap<String, String>,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<Timeouts>,
}

impl ResourceState for KnowledgeBaseState {
    fn id(&self) -> &str {
        &self.id
    }
}

impl KnowledgeBaseState {
    fn from_remote(kb: KnowledgeBase, tags: BTreeMap<String, String>, tags_all: BTreeMap<String, String>) -> Self {
        Self {
            id: kb.knowledge_base_id,
            arn: kb.knowledge_base_arn,
            name: kb.name,
            description: kb.description,
            role_arn: kb.role_arn,
            knowledge_base_configuration: kb.knowledge_base_configuration.into(),
            storage_configuration: kb.storage_configuration.map(Into::into),
            created_at: kb.created_at.to_rfc3339(),
            updated_at: kb.updated_at.to_rfc3339(),
            failure_reasons: kb.failure_reasons,
            tags,
            tags_all,
            timeouts: None,
        }
    }
}

/// Prior values the service does not echo back
#[derive(Debug, Clone, Default)]
struct ReadContext {
    tags: BTreeMap<String, String>,
    timeouts: Option<Timeouts>,
}

pub struct KnowledgeBaseResource {
    conn: Arc<dyn BedrockAgentApi>,
    tags: TagsContext,
    wait: WaitSettings,
}

impl KnowledgeBaseResource {
    pub fn new(clients: &Clients) -> Self {
        Self {
            conn: clients.bedrock_agent.clone(),
            tags: clients.tags.clone(),
            wait: clients.wait,
        }
    }

    async fn read_with(&self, id: &str, ctx: ReadContext) -> Result<KnowledgeBaseState> {
        let kb = find_knowledge_base_by_id(self.conn.as_ref(), id).await?;

        debug!(knowledge_base = id, "ListTagsForResource");
        let (tags, tags_all) = read_tags(self.conn.as_ref(), &self.tags, &kb.knowledge_base_arn, &ctx.tags)
            .await
            .map_err(|e| ProviderError::api(ErrAction::ListingTags, RESOURCE_NAME, id, e))?;

        let mut state = KnowledgeBaseState::from_remote(kb, tags, tags_all);
        state.timeouts = ctx.timeouts;
        Ok(state)
    }
}

fn wait_error(id: &str, operation: &'static str, source: ProviderError) -> ProviderError {
    ProviderError::Wait {
        resource: RESOURCE_NAME.to_string(),
        id: id.to_string(),
        operation,
        source: Box::new(source),
    }
}

/// Idempotency token for `CreateKnowledgeBase`
fn client_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn duration_attribute() -> Attribute {
    Attribute::optional_string().with_validator(Validator::Duration)
}

#[async_trait]
impl ResourceHandler for KnowledgeBaseResource {
    type Config = KnowledgeBaseConfig;
    type State = KnowledgeBaseState;

    const TYPE_NAME: &'static str = "aws_bedrockagent_knowledge_base";
    const DISPLAY_NAME: &'static str = RESOURCE_NAME;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute(ATTR_ID, Attribute::computed_string())
            .with_attribute(ATTR_ARN, Attribute::computed_string())
            .with_attribute(
                ATTR_NAME,
                Attribute::required_string().with_validator(Validator::pattern(NAME_PATTERN)),
            )
            .with_attribute(
                ATTR_DESCRIPTION,
                Attribute::optional_string().with_validator(Validator::length_between(1, 200)),
            )
            .with_attribute(
                ATTR_ROLE_ARN,
                Attribute::required_string()
                    .with_validator(Validator::Arn)
                    .with_description("IAM role the service assumes to reach the vector store"),
            )
            .with_block(ATTR_KNOWLEDGE_BASE_CONFIGURATION, knowledge_base_configuration_schema())
            .with_block(ATTR_STORAGE_CONFIGURATION, storage_configuration_schema())
            .with_attribute(ATTR_CREATED_AT, Attribute::computed_string())
            .with_attribute(ATTR_UPDATED_AT, Attribute::computed_string())
            .with_attribute(ATTR_FAILURE_REASONS, Attribute::computed_string_list())
            .with_attribute(ATTR_TAGS, Attribute::tags())
            .with_attribute(ATTR_TAGS_ALL, Attribute::tags_all())
            .with_block(
                ATTR_TIMEOUTS,
                NestedBlock::optional(
                    Block::new()
                        .with_attribute("create", duration_attribute())
                        .with_attribute("update", duration_attribute())
                        .with_attribute("delete", duration_attribute()),
                )
                .local_only(),
            )
    }

    fn validate(&self, config: &KnowledgeBaseConfig) -> Vec<ValidationErrorInfo> {
        let mut errors = Vec::new();

        match config.role_arn.parse::<Arn>() {
            Ok(arn) if arn.service == "iam" && arn.resource.starts_with("role/") => {}
            _ => errors.push(
                ValidationErrorInfo::new("/role_arn", "must be an IAM role ARN")
                    .with_actual(config.role_arn.clone()),
            ),
        }

        let kb = &config.knowledge_base_configuration;
        match &kb.vector_knowledge_base_configuration {
            None if kb.kind == KNOWLEDGE_BASE_TYPE_VECTOR => errors.push(ValidationErrorInfo::new(
                "/knowledge_base_configuration/0",
                "vector_knowledge_base_configuration is required for type VECTOR",
            )),
            None => {}
            Some(vector) => {
                let is_bedrock = vector
                    .embedding_model_arn
                    .parse::<Arn>()
                    .is_ok_and(|arn| arn.service == "bedrock");
                if !is_bedrock {
                    errors.push(ValidationErrorInfo::new(
                        "/knowledge_base_configuration/0/vector_knowledge_base_configuration/0/embedding_model_arn",
                        "must be a Bedrock model ARN",
                    ));
                }

                let locations = vector
                    .supplemental_data_storage_configuration
                    .iter()
                    .flat_map(|s| s.storage_location.iter());
                for (i, location) in locations.enumerate() {
                    if location.s3_location.is_none() {
                        errors.push(ValidationErrorInfo::new(
                            format!(
                                "/knowledge_base_configuration/0/vector_knowledge_base_configuration/0/supplemental_data_storage_configuration/0/storage_location/{}",
                                i
                            ),
                            format!("s3_location is required for type {}", location.kind),
                        ));
                    }
                }
            }
        }

        let storage = &config.storage_configuration;
        if !storage.has_matching_block() {
            let block = storage.matching_block_name().unwrap_or("a matching configuration block");
            errors.push(
                ValidationErrorInfo::new(
                    "/storage_configuration/0",
                    format!("{} is required for type {}", block, storage.kind),
                )
                .with_expected(block),
            );
        }

        errors
    }

    async fn create(&self, config: &KnowledgeBaseConfig) -> Result<KnowledgeBaseState> {
        let input = CreateKnowledgeBaseInput {
            client_token: Some(client_token()),
            name: config.name.clone(),
            description: config.description.clone(),
            role_arn: config.role_arn.clone(),
            knowledge_base_configuration: config.knowledge_base_configuration.to_api(),
            storage_configuration: Some(config.storage_configuration.to_api()),
            tags: desired_tags_all(&self.tags, &config.tags).into_map(),
        };

        debug!(name = %config.name, "CreateKnowledgeBase");
        let output = self
            .conn
            .create_knowledge_base(input)
            .await
            .map_err(|e| ProviderError::api(ErrAction::Creating, RESOURCE_NAME, &config.name, e))?;
        let id = output.knowledge_base.knowledge_base_id;
        info!(knowledge_base = %id, name = %config.name, "created knowledge base");

        let timeout = config.timeouts.clone().unwrap_or_default().create_or(DEFAULT_TIMEOUT);
        wait_knowledge_base_created(self.conn.as_ref(), &id, timeout, self.wait)
            .await
            .map_err(|e| wait_error(&id, "create", e))?;

        let ctx = ReadContext {
            tags: config.tags.clone(),
            timeouts: config.timeouts.clone(),
        };
        self.read_with(&id, ctx).await.map_err(|e| match e {
            ProviderError::NotFound { resource, id } => ProviderError::NewResourceNotFound { resource, id },
            other => other,
        })
    }

    async fn read(&self, id: &str, prior: Option<&KnowledgeBaseState>) -> Result<KnowledgeBaseState> {
        let ctx = prior
            .map(|p| ReadContext {
                tags: p.tags.clone(),
                timeouts: p.timeouts.clone(),
            })
            .unwrap_or_default();
        self.read_with(id, ctx).await
    }

    async fn update(
        &self,
        prior: &KnowledgeBaseState,
        config: &KnowledgeBaseConfig,
        changes: &ChangeSet,
    ) -> Result<KnowledgeBaseState> {
        let id = prior.id.as_str();
        let timeouts = config.timeouts.clone().unwrap_or_default();

        if changes.has_changes(&[
            ATTR_NAME,
            ATTR_DESCRIPTION,
            ATTR_ROLE_ARN,
            ATTR_KNOWLEDGE_BASE_CONFIGURATION,
            ATTR_STORAGE_CONFIGURATION,
        ]) {
            let input = UpdateKnowledgeBaseInput {
                knowledge_base_id: id.to_string(),
                name: config.name.clone(),
                description: config.description.clone(),
                role_arn: config.role_arn.clone(),
                knowledge_base_configuration: config.knowledge_base_configuration.to_api(),
                storage_configuration: Some(config.storage_configuration.to_api()),
            };

            debug!(knowledge_base = id, "UpdateKnowledgeBase");
            self.conn
                .update_knowledge_base(input)
                .await
                .map_err(|e| ProviderError::api(ErrAction::Updating, RESOURCE_NAME, id, e))?;

            wait_knowledge_base_updated(
                self.conn.as_ref(),
                id,
                timeouts.update_or(DEFAULT_TIMEOUT),
                self.wait,
            )
            .await
            .map_err(|e| wait_error(id, "update", e))?;
        }

        if changes.has_changes(&[ATTR_TAGS, ATTR_TAGS_ALL]) {
            let old = KeyValueTags::from(prior.tags_all.clone());
            let new = desired_tags_all(&self.tags, &config.tags);
            update_tags(self.conn.as_ref(), &prior.arn, &old, &new)
                .await
                .map_err(|e| ProviderError::api(ErrAction::Tagging, RESOURCE_NAME, id, e))?;
        }

        let ctx = ReadContext {
            tags: config.tags.clone(),
            timeouts: config.timeouts.clone(),
        };
        self.read_with(id, ctx).await
    }

    async fn delete(&self, state: &KnowledgeBaseState) -> Result<()> {
        debug!(knowledge_base = %state.id, "DeleteKnowledgeBase");
        match self.conn.delete_knowledge_base(&state.id).await {
            Ok(_) => {}
            Err(e) if e.is_code(error_codes::RESOURCE_NOT_FOUND) => return Ok(()),
            Err(e) => return Err(ProviderError::api(ErrAction::Deleting, RESOURCE_NAME, &state.id, e)),
        }

        let timeout = state.timeouts.clone().unwrap_or_default().delete_or(DEFAULT_TIMEOUT);
        wait_knowledge_base_deleted(self.conn.as_ref(), &state.id, timeout, self.wait)
            .await
            .map_err(|e| wait_error(&state.id, "delete", e))?;
        info!(knowledge_base = %state.id, "deleted knowledge base");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::DynResource;
    use cirrus_client::{MockBedrockAgent, MockCodeCommit};
    use serde_json::json;

    fn rds_config() -> serde_json::Value {
        json!({
            "name": "kb-test",
            "role_arn": "arn:aws:iam::123456789012:role/kb",
            "knowledge_base_configuration": {
                "type": "VECTOR",
                "vector_knowledge_base_configuration": {
                    "embedding_model_arn": "arn:aws:bedrock:us-west-2::foundation-model/amazon.titan-embed-text-v1",
                },
            },
            "storage_configuration": {
                "type": "RDS",
                "rds_configuration": {
                    "credentials_secret_arn": "arn:aws:secretsmanager:us-west-2:123456789012:secret:db",
                    "database_name": "postgres",
                    "resource_arn": "arn:aws:rds:us-west-2:123456789012:cluster:kb",
                    "table_name": "bedrock_integration.bedrock_kb",
                    "field_mapping": {
                        "vector_field": "embedding",
                        "text_field": "chunks",
                        "metadata_field": "metadata",
                        "primary_key_field": "id",
                    },
                },
            },
        })
    }

    fn resource(mock: &MockBedrockAgent) -> DynResource {
        DynResource::new(KnowledgeBaseResource::new(&Clients::in_memory(
            MockCodeCommit::new(),
            mock.clone(),
        )))
        .unwrap()
    }

    fn validation_paths(err: ProviderError) -> Vec<String> {
        match err {
            ProviderError::Validation { errors, .. } => errors.into_iter().map(|e| e.path).collect(),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_client_token_shape() {
        let token = client_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_schema_rejects_bad_name_and_enum() {
        let resource = resource(&MockBedrockAgent::new());

        let mut config = rds_config();
        config["name"] = json!("bad name!");
        assert!(resource.validate(&config).is_err());

        let mut config = rds_config();
        config["storage_configuration"]["type"] = json!("MONGODB");
        assert!(resource.validate(&config).is_err());

        let mut config = rds_config();
        config["description"] = json!("d".repeat(201));
        assert!(resource.validate(&config).is_err());
    }

    #[test]
    fn test_cross_field_validation() {
        let resource = resource(&MockBedrockAgent::new());

        let mut config = rds_config();
        config["role_arn"] = json!("arn:aws:s3:::bucket");
        config["storage_configuration"]["type"] = json!("PINECONE");
        let paths = validation_paths(resource.validate(&config).unwrap_err());
        assert_eq!(paths, vec!["/role_arn", "/storage_configuration/0"]);
    }

    #[tokio::test]
    async fn test_create_waits_for_active() {
        let mock = MockBedrockAgent::new();
        mock.set_settle_after(3);
        let resource = resource(&mock);

        let config = resource.validate(&rds_config()).unwrap();
        let state = resource.create(&config).await.unwrap();

        let id = resource.state_id(&state).unwrap().to_string();
        assert_eq!(mock.knowledge_base(&id).unwrap().status.as_str(), "ACTIVE");
        assert_eq!(
            state["storage_configuration"][0]["rds_configuration"][0]["table_name"],
            "bedrock_integration.bedrock_kb"
        );
        assert!(mock.call_count("GetKnowledgeBase") >= 3);
        assert!(resource.plan(Some(&state), Some(&config)).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_delete_of_missing_knowledge_base_succeeds() {
        let mock = MockBedrockAgent::new();
        let resource = resource(&mock);
        let config = resource.validate(&rds_config()).unwrap();
        let state = resource.create(&config).await.unwrap();

        let id = resource.state_id(&state).unwrap().to_string();
        mock.delete_out_of_band(&id);
        mock.clear_calls();

        resource.delete(&state).await.unwrap();
        assert_eq!(mock.calls(), vec!["DeleteKnowledgeBase"]);
    }
}
