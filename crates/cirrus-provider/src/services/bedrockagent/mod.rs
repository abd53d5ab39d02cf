//! Bedrock Agent resources

mod blocks;
mod find;
mod knowledge_base;
mod wait;

pub use blocks::{KnowledgeBaseConfigurationBlock, StorageConfigurationBlock};
pub use find::{KnowledgeBaseFinder, find_knowledge_base_by_id};
pub use knowledge_base::{KnowledgeBaseConfig, KnowledgeBaseResource, KnowledgeBaseState};

use crate::dynamic::DynResource;
use crate::registry::{ResourceRegistration, ServicePackage, TagsSpec};

pub struct BedrockAgentPackage;

impl ServicePackage for BedrockAgentPackage {
    fn name(&self) -> &'static str {
        "bedrockagent"
    }

    fn resources(&self) -> Vec<ResourceRegistration> {
        vec![ResourceRegistration {
            type_name: "aws_bedrockagent_knowledge_base",
            name: "Knowledge Base",
            tags: Some(TagsSpec {
                identifier_attribute: "arn",
            }),
            factory: |clients| DynResource::new(KnowledgeBaseResource::new(clients)),
        }]
    }
}
