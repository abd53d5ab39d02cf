//! Bedrock Agent knowledge bases API
//!
//! REST-JSON protocol:
//! - `PUT /knowledgebases/` creates
//! - `GET|PUT|DELETE /knowledgebases/{id}` reads, updates, deletes
//! - `GET|POST|DELETE /tags/{arn}` manages tags

mod client;
mod mock;
pub mod types;

pub use client::BedrockAgentClient;
pub use mock::MockBedrockAgent;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;
use crate::tagging::ResourceTagger;

/// Error codes returned by Bedrock Agent
pub mod error_codes {
    pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
    pub const CONFLICT: &str = "ConflictException";
    pub const VALIDATION: &str = "ValidationException";
    pub const THROTTLING: &str = "ThrottlingException";
    pub const ACCESS_DENIED: &str = "AccessDeniedException";
    pub const SERVICE_QUOTA_EXCEEDED: &str = "ServiceQuotaExceededException";
    pub const INTERNAL_SERVER: &str = "InternalServerException";
}

/// Bedrock Agent operations used by the knowledge base resource
#[async_trait]
pub trait BedrockAgentApi: ResourceTagger {
    async fn create_knowledge_base(&self, input: CreateKnowledgeBaseInput) -> Result<CreateKnowledgeBaseOutput>;

    async fn get_knowledge_base(&self, knowledge_base_id: &str) -> Result<GetKnowledgeBaseOutput>;

    async fn update_knowledge_base(&self, input: UpdateKnowledgeBaseInput) -> Result<UpdateKnowledgeBaseOutput>;

    async fn delete_knowledge_base(&self, knowledge_base_id: &str) -> Result<DeleteKnowledgeBaseOutput>;
}
