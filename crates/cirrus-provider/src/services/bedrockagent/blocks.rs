//! Nested configuration blocks of a knowledge base
//!
//! Blocks are stored as single-element lists (`storage_configuration.0.type`)
//! and converted to and from the service's camelCase shapes.

use cirrus_client::bedrockagent::{
    BedrockEmbeddingModelConfiguration, EmbeddingModelConfiguration, KnowledgeBaseConfiguration,
    OpenSearchServerlessConfiguration, OpenSearchServerlessFieldMapping, PineconeConfiguration,
    PineconeFieldMapping, RdsConfiguration, RdsFieldMapping, RedisEnterpriseCloudConfiguration,
    RedisEnterpriseCloudFieldMapping, S3Location, StorageConfiguration,
    SupplementalDataStorageConfiguration, SupplementalDataStorageLocation,
    VectorKnowledgeBaseConfiguration,
};
use cirrus_core::serde_ext::{optional_block, required_block};
use cirrus_core::{Attribute, Block, NestedBlock, Validator};
use serde::{Deserialize, Serialize};

pub const KNOWLEDGE_BASE_TYPE_VECTOR: &str = "VECTOR";

pub const STORAGE_OPENSEARCH_SERVERLESS: &str = "OPENSEARCH_SERVERLESS";
pub const STORAGE_PINECONE: &str = "PINECONE";
pub const STORAGE_RDS: &str = "RDS";
pub const STORAGE_REDIS_ENTERPRISE_CLOUD: &str = "REDIS_ENTERPRISE_CLOUD";

pub const STORAGE_TYPES: [&str; 4] = [
    STORAGE_OPENSEARCH_SERVERLESS,
    STORAGE_PINECONE,
    STORAGE_RDS,
    STORAGE_REDIS_ENTERPRISE_CLOUD,
];

const EMBEDDING_DATA_TYPES: [&str; 2] = ["FLOAT32", "BINARY"];
const SUPPLEMENTAL_STORAGE_S3: &str = "S3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseConfigurationBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub vector_knowledge_base_configuration: Option<VectorBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorBlock {
    pub embedding_model_arn: String,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub embedding_model_configuration: Option<EmbeddingModelBlock>,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub supplemental_data_storage_configuration: Option<SupplementalStorageBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingModelBlock {
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub bedrock_embedding_model_configuration: Option<BedrockEmbeddingBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedrockEmbeddingBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_data_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementalStorageBlock {
    #[serde(default)]
    pub storage_location: Vec<StorageLocationBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageLocationBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub s3_location: Option<S3LocationBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3LocationBlock {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfigurationBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub opensearch_serverless_configuration: Option<OpenSearchServerlessBlock>,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub pinecone_configuration: Option<PineconeBlock>,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub rds_configuration: Option<RdsBlock>,
    #[serde(default, with = "optional_block", skip_serializing_if = "Option::is_none")]
    pub redis_enterprise_cloud_configuration: Option<RedisEnterpriseCloudBlock>,
}

impl StorageConfigurationBlock {
    /// Whether the nested block matching `type` is present
    pub fn has_matching_block(&self) -> bool {
        match self.kind.as_str() {
            STORAGE_OPENSEARCH_SERVERLESS => self.opensearch_serverless_configuration.is_some(),
            STORAGE_PINECONE => self.pinecone_configuration.is_some(),
            STORAGE_RDS => self.rds_configuration.is_some(),
            STORAGE_REDIS_ENTERPRISE_CLOUD => self.redis_enterprise_cloud_configuration.is_some(),
            _ => false,
        }
    }

    pub fn matching_block_name(&self) -> Option<&'static str> {
        match self.kind.as_str() {
            STORAGE_OPENSEARCH_SERVERLESS => Some("opensearch_serverless_configuration"),
            STORAGE_PINECONE => Some("pinecone_configuration"),
            STORAGE_RDS => Some("rds_configuration"),
            STORAGE_REDIS_ENTERPRISE_CLOUD => Some("redis_enterprise_cloud_configuration"),
            _ => None,
        }
    }
}

/// Column or field names shared by every vector store; the schema decides
/// which of them each store requires
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMappingBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenSearchServerlessBlock {
    pub collection_arn: String,
    pub vector_index_name: String,
    #[serde(with = "required_block")]
    pub field_mapping: FieldMappingBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PineconeBlock {
    pub connection_string: String,
    pub credentials_secret_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(with = "required_block")]
    pub field_mapping: FieldMappingBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdsBlock {
    pub credentials_secret_arn: String,
    pub database_name: String,
    pub resource_arn: String,
    pub table_name: String,
    #[serde(with = "required_block")]
    pub field_mapping: FieldMappingBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisEnterpriseCloudBlock {
    pub credentials_secret_arn: String,
    pub endpoint: String,
    pub vector_index_name: String,
    #[serde(with = "required_block")]
    pub field_mapping: FieldMappingBlock,
}

// Schema

fn field_mapping(required: &[&str]) -> NestedBlock {
    let block = required.iter().fold(Block::new(), |block, field| {
        block.with_attribute(*field, Attribute::required_string())
    });
    NestedBlock::required(block)
}

pub fn knowledge_base_configuration_schema() -> NestedBlock {
    let bedrock_embedding = Block::new()
        .with_attribute("dimensions", Attribute::optional_int())
        .with_attribute(
            "embedding_data_type",
            Attribute::optional_string().with_validator(Validator::one_of(EMBEDDING_DATA_TYPES)),
        );

    let storage_location = Block::new()
        .with_attribute(
            "type",
            Attribute::required_string().with_validator(Validator::one_of([SUPPLEMENTAL_STORAGE_S3])),
        )
        .with_block(
            "s3_location",
            NestedBlock::optional(Block::new().with_attribute("uri", Attribute::required_string())),
        );

    let vector = Block::new()
        .with_attribute(
            "embedding_model_arn",
            Attribute::required_string().with_validator(Validator::Arn),
        )
        .with_block(
            "embedding_model_configuration",
            NestedBlock::optional(
                Block::new().with_block("bedrock_embedding_model_configuration", NestedBlock::optional(bedrock_embedding)),
            ),
        )
        .with_block(
            "supplemental_data_storage_configuration",
            NestedBlock::optional(Block::new().with_block("storage_location", NestedBlock::required(storage_location))),
        );

    NestedBlock::required(
        Block::new()
            .with_attribute(
                "type",
                Attribute::required_string().with_validator(Validator::one_of([KNOWLEDGE_BASE_TYPE_VECTOR])),
            )
            .with_block("vector_knowledge_base_configuration", NestedBlock::optional(vector)),
    )
    .requires_replace()
}

pub fn storage_configuration_schema() -> NestedBlock {
    let arn = || Attribute::required_string().with_validator(Validator::Arn);

    let opensearch = Block::new()
        .with_attribute("collection_arn", arn())
        .with_attribute("vector_index_name", Attribute::required_string())
        .with_block("field_mapping", field_mapping(&["metadata_field", "text_field", "vector_field"]));

    let pinecone = Block::new()
        .with_attribute("connection_string", Attribute::required_string())
        .with_attribute("credentials_secret_arn", arn())
        .with_attribute("namespace", Attribute::optional_string())
        .with_block("field_mapping", field_mapping(&["metadata_field", "text_field"]));

    let rds = Block::new()
        .with_attribute("credentials_secret_arn", arn())
        .with_attribute("database_name", Attribute::required_string())
        .with_attribute("resource_arn", arn())
        .with_attribute("table_name", Attribute::required_string())
        .with_block(
            "field_mapping",
            field_mapping(&["metadata_field", "primary_key_field", "text_field", "vector_field"]),
        );

    let redis = Block::new()
        .with_attribute("credentials_secret_arn", arn())
        .with_attribute("endpoint", Attribute::required_string())
        .with_attribute("vector_index_name", Attribute::required_string())
        .with_block("field_mapping", field_mapping(&["metadata_field", "text_field", "vector_field"]));

    NestedBlock::required(
        Block::new()
            .with_attribute(
                "type",
                Attribute::required_string().with_validator(Validator::one_of(STORAGE_TYPES)),
            )
            .with_block("opensearch_serverless_configuration", NestedBlock::optional(opensearch))
            .with_block("pinecone_configuration", NestedBlock::optional(pinecone))
            .with_block("rds_configuration", NestedBlock::optional(rds))
            .with_block("redis_enterprise_cloud_configuration", NestedBlock::optional(redis)),
    )
    .requires_replace()
}

// Conversions to the service shapes

impl KnowledgeBaseConfigurationBlock {
    pub fn to_api(&self) -> KnowledgeBaseConfiguration {
        KnowledgeBaseConfiguration {
            kind: self.kind.clone(),
            vector_knowledge_base_configuration: self.vector_knowledge_base_configuration.as_ref().map(|v| {
                VectorKnowledgeBaseConfiguration {
                    embedding_model_arn: v.embedding_model_arn.clone(),
                    embedding_model_configuration: v.embedding_model_configuration.as_ref().map(|e| {
                        EmbeddingModelConfiguration {
                            bedrock_embedding_model_configuration: e
                                .bedrock_embedding_model_configuration
                                .as_ref()
                                .map(|b| BedrockEmbeddingModelConfiguration {
                                    dimensions: b.dimensions,
                                    embedding_data_type: b.embedding_data_type.clone(),
                                }),
                        }
                    }),
                    supplemental_data_storage_configuration: v.supplemental_data_storage_configuration.as_ref().map(
                        |s| SupplementalDataStorageConfiguration {
                            storage_locations: s
                                .storage_location
                                .iter()
                                .map(|l| SupplementalDataStorageLocation {
                                    kind: l.kind.clone(),
                                    s3_location: l.s3_location.as_ref().map(|s3| S3Location { uri: s3.uri.clone() }),
                                })
                                .collect(),
                        },
                    ),
                }
            }),
        }
    }
}

impl From<KnowledgeBaseConfiguration> for KnowledgeBaseConfigurationBlock {
    fn from(api: KnowledgeBaseConfiguration) -> Self {
        Self {
            kind: api.kind,
            vector_knowledge_base_configuration: api.vector_knowledge_base_configuration.map(|v| VectorBlock {
                embedding_model_arn: v.embedding_model_arn,
                embedding_model_configuration: v.embedding_model_configuration.map(|e| EmbeddingModelBlock {
                    bedrock_embedding_model_configuration: e.bedrock_embedding_model_configuration.map(|b| {
                        BedrockEmbeddingBlock {
                            dimensions: b.dimensions,
                            embedding_data_type: b.embedding_data_type,
                        }
                    }),
                }),
                supplemental_data_storage_configuration: v.supplemental_data_storage_configuration.map(|s| {
                    SupplementalStorageBlock {
                        storage_location: s
                            .storage_locations
                            .into_iter()
                            .map(|l| StorageLocationBlock {
                                kind: l.kind,
                                s3_location: l.s3_location.map(|s3| S3LocationBlock { uri: s3.uri }),
                            })
                            .collect(),
                    }
                }),
            }),
        }
    }
}

impl FieldMappingBlock {
    fn field(value: &Option<String>) -> String {
        value.clone().unwrap_or_default()
    }
}

impl StorageConfigurationBlock {
    pub fn to_api(&self) -> StorageConfiguration {
        StorageConfiguration {
            kind: self.kind.clone(),
            opensearch_serverless_configuration: self.opensearch_serverless_configuration.as_ref().map(|o| {
                OpenSearchServerlessConfiguration {
                    collection_arn: o.collection_arn.clone(),
                    vector_index_name: o.vector_index_name.clone(),
                    field_mapping: OpenSearchServerlessFieldMapping {
                        metadata_field: FieldMappingBlock::field(&o.field_mapping.metadata_field),
                        text_field: FieldMappingBlock::field(&o.field_mapping.text_field),
                        vector_field: FieldMappingBlock::field(&o.field_mapping.vector_field),
                    },
                }
            }),
            pinecone_configuration: self.pinecone_configuration.as_ref().map(|p| PineconeConfiguration {
                connection_string: p.connection_string.clone(),
                credentials_secret_arn: p.credentials_secret_arn.clone(),
                namespace: p.namespace.clone(),
                field_mapping: PineconeFieldMapping {
                    metadata_field: FieldMappingBlock::field(&p.field_mapping.metadata_field),
                    text_field: FieldMappingBlock::field(&p.field_mapping.text_field),
                },
            }),
            rds_configuration: self.rds_configuration.as_ref().map(|r| RdsConfiguration {
                credentials_secret_arn: r.credentials_secret_arn.clone(),
                database_name: r.database_name.clone(),
                resource_arn: r.resource_arn.clone(),
                table_name: r.table_name.clone(),
                field_mapping: RdsFieldMapping {
                    metadata_field: FieldMappingBlock::field(&r.field_mapping.metadata_field),
                    primary_key_field: FieldMappingBlock::field(&r.field_mapping.primary_key_field),
                    text_field: FieldMappingBlock::field(&r.field_mapping.text_field),
                    vector_field: FieldMappingBlock::field(&r.field_mapping.vector_field),
                },
            }),
            redis_enterprise_cloud_configuration: self.redis_enterprise_cloud_configuration.as_ref().map(|r| {
                RedisEnterpriseCloudConfiguration {
                    credentials_secret_arn: r.credentials_secret_arn.clone(),
                    endpoint: r.endpoint.clone(),
                    vector_index_name: r.vector_index_name.clone(),
                    field_mapping: RedisEnterpriseCloudFieldMapping {
                        metadata_field: FieldMappingBlock::field(&r.field_mapping.metadata_field),
                        text_field: FieldMappingBlock::field(&r.field_mapping.text_field),
                        vector_field: FieldMappingBlock::field(&r.field_mapping.vector_field),
                    },
                }
            }),
        }
    }
}

impl From<StorageConfiguration> for StorageConfigurationBlock {
    fn from(api: StorageConfiguration) -> Self {
        Self {
            kind: api.kind,
            opensearch_serverless_configuration: api.opensearch_serverless_configuration.map(|o| {
                OpenSearchServerlessBlock {
                    collection_arn: o.collection_arn,
                    vector_index_name: o.vector_index_name,
                    field_mapping: FieldMappingBlock {
                        metadata_field: Some(o.field_mapping.metadata_field),
                        text_field: Some(o.field_mapping.text_field),
                        vector_field: Some(o.field_mapping.vector_field),
                        ..Default::default()
                    },
                }
            }),
            pinecone_configuration: api.pinecone_configuration.map(|p| PineconeBlock {
                connection_string: p.connection_string,
                credentials_secret_arn: p.credentials_secret_arn,
                namespace: p.namespace,
                field_mapping: FieldMappingBlock {
                    metadata_field: Some(p.field_mapping.metadata_field),
                    text_field: Some(p.field_mapping.text_field),
                    ..Default::default()
                },
            }),
            rds_configuration: api.rds_configuration.map(|r| RdsBlock {
                credentials_secret_arn: r.credentials_secret_arn,
                database_name: r.database_name,
                resource_arn: r.resource_arn,
                table_name: r.table_name,
                field_mapping: FieldMappingBlock {
                    metadata_field: Some(r.field_mapping.metadata_field),
                    primary_key_field: Some(r.field_mapping.primary_key_field),
                    text_field: Some(r.field_mapping.text_field),
                    vector_field: Some(r.field_mapping.vector_field),
                },
            }),
            redis_enterprise_cloud_configuration: api.redis_enterprise_cloud_configuration.map(|r| {
                RedisEnterpriseCloudBlock {
                    credentials_secret_arn: r.credentials_secret_arn,
                    endpoint: r.endpoint,
                    vector_index_name: r.vector_index_name,
                    field_mapping: FieldMappingBlock {
                        metadata_field: Some(r.field_mapping.metadata_field),
                        text_field: Some(r.field_mapping.text_field),
                        vector_field: Some(r.field_mapping.vector_field),
                        ..Default::default()
                    },
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_objects_and_lists_deserialize_alike() {
        let from_object: StorageConfigurationBlock = serde_json::from_value(json!({
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
        }))
        .unwrap();

        let round_trip: StorageConfigurationBlock =
            serde_json::from_value(serde_json::to_value(&from_object).unwrap()).unwrap();
        assert_eq!(from_object, round_trip);
        assert!(from_object.has_matching_block());

        let api = from_object.to_api();
        assert_eq!(api.rds_configuration.unwrap().field_mapping.primary_key_field, "id");
    }

    #[test]
    fn test_pinecone_mapping_has_no_vector_field() {
        let api = StorageConfiguration {
            pinecone_configuration: Some(PineconeConfiguration {
                connection_string: "https://kb.pinecone.io".to_string(),
                credentials_secret_arn: "arn:aws:secretsmanager:us-west-2:123456789012:secret:pc".to_string(),
                namespace: None,
                field_mapping: PineconeFieldMapping {
                    metadata_field: "metadata".to_string(),
                    text_field: "text".to_string(),
                },
            }),
            ..StorageConfiguration::new(STORAGE_PINECONE)
        };

        let block = StorageConfigurationBlock::from(api);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value["pinecone_configuration"][0]["field_mapping"],
            json!([{ "metadata_field": "metadata", "text_field": "text" }])
        );
        assert_eq!(block.matching_block_name(), Some("pinecone_configuration"));
    }
}
