//! Bedrock Agent knowledge base shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status of a knowledge base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KnowledgeBaseStatus {
    Creating,
    Active,
    Deleting,
    Updating,
    Failed,
    DeleteUnsuccessful,
}

impl KnowledgeBaseStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            KnowledgeBaseStatus::Creating => "CREATING",
            KnowledgeBaseStatus::Active => "ACTIVE",
            KnowledgeBaseStatus::Deleting => "DELETING",
            KnowledgeBaseStatus::Updating => "UPDATING",
            KnowledgeBaseStatus::Failed => "FAILED",
            KnowledgeBaseStatus::DeleteUnsuccessful => "DELETE_UNSUCCESSFUL",
        }
    }
}

impl fmt::Display for KnowledgeBaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfiguration {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_knowledge_base_configuration: Option<VectorKnowledgeBaseConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorKnowledgeBaseConfiguration {
    pub embedding_model_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model_configuration: Option<EmbeddingModelConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplemental_data_storage_configuration: Option<SupplementalDataStorageConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingModelConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrock_embedding_model_configuration: Option<BedrockEmbeddingModelConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockEmbeddingModelConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_data_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementalDataStorageConfiguration {
    pub storage_locations: Vec<SupplementalDataStorageLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementalDataStorageLocation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_location: Option<S3Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Location {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfiguration {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opensearch_serverless_configuration: Option<OpenSearchServerlessConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinecone_configuration: Option<PineconeConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rds_configuration: Option<RdsConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_enterprise_cloud_configuration: Option<RedisEnterpriseCloudConfiguration>,
}

impl StorageConfiguration {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            opensearch_serverless_configuration: None,
            pinecone_configuration: None,
            rds_configuration: None,
            redis_enterprise_cloud_configuration: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSearchServerlessConfiguration {
    pub collection_arn: String,
    pub vector_index_name: String,
    pub field_mapping: OpenSearchServerlessFieldMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSearchServerlessFieldMapping {
    pub metadata_field: String,
    pub text_field: String,
    pub vector_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PineconeConfiguration {
    pub connection_string: String,
    pub credentials_secret_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub field_mapping: PineconeFieldMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PineconeFieldMapping {
    pub metadata_field: String,
    pub text_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdsConfiguration {
    pub credentials_secret_arn: String,
    pub database_name: String,
    pub resource_arn: String,
    pub table_name: String,
    pub field_mapping: RdsFieldMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdsFieldMapping {
    pub metadata_field: String,
    pub primary_key_field: String,
    pub text_field: String,
    pub vector_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedisEnterpriseCloudConfiguration {
    pub credentials_secret_arn: String,
    pub endpoint: String,
    pub vector_index_name: String,
    pub field_mapping: RedisEnterpriseCloudFieldMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedisEnterpriseCloudFieldMapping {
    pub metadata_field: String,
    pub text_field: String,
    pub vector_field: String,
}

/// A knowledge base as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    pub knowledge_base_id: String,
    pub knowledge_base_arn: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub role_arn: String,
    pub knowledge_base_configuration: KnowledgeBaseConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_configuration: Option<StorageConfiguration>,
    pub status: KnowledgeBaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKnowledgeBaseInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub role_arn: String,
    pub knowledge_base_configuration: KnowledgeBaseConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_configuration: Option<StorageConfiguration>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKnowledgeBaseOutput {
    pub knowledge_base: KnowledgeBase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetKnowledgeBaseOutput {
    pub knowledge_base: KnowledgeBase,
}

/// Update request; the id travels in the path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKnowledgeBaseInput {
    #[serde(skip)]
    pub knowledge_base_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub role_arn: String,
    pub knowledge_base_configuration: KnowledgeBaseConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_configuration: Option<StorageConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKnowledgeBaseOutput {
    pub knowledge_base: KnowledgeBase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteKnowledgeBaseOutput {
    pub knowledge_base_id: String,
    pub status: KnowledgeBaseStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct TagsBody {
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}
