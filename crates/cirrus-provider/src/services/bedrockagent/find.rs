use async_trait::async_trait;
use cirrus_client::bedrockagent::{KnowledgeBase, error_codes};
use cirrus_client::BedrockAgentApi;
use std::sync::Arc;
use tracing::debug;

use super::knowledge_base::RESOURCE_NAME;
use crate::check::Finder;
use crate::error::{ErrAction, ProviderError, Result};

/// Look a knowledge base up by id
pub async fn find_knowledge_base_by_id(conn: &dyn BedrockAgentApi, id: &str) -> Result<KnowledgeBase> {
    debug!(knowledge_base = id, "GetKnowledgeBase");

    conn.get_knowledge_base(id)
        .await
        .map(|output| output.knowledge_base)
        .map_err(|e| {
            if e.is_code(error_codes::RESOURCE_NOT_FOUND) {
                ProviderError::not_found(RESOURCE_NAME, id)
            } else {
                ProviderError::api(ErrAction::Reading, RESOURCE_NAME, id, e)
            }
        })
}

/// Knowledge base finder for existence checks
#[derive(Clone)]
pub struct KnowledgeBaseFinder {
    conn: Arc<dyn BedrockAgentApi>,
}

impl KnowledgeBaseFinder {
    pub fn new(conn: Arc<dyn BedrockAgentApi>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Finder for KnowledgeBaseFinder {
    type Output = KnowledgeBase;

    fn resource_name(&self) -> &str {
        RESOURCE_NAME
    }

    async fn find(&self, id: &str) -> Result<KnowledgeBase> {
        find_knowledge_base_by_id(self.conn.as_ref(), id).await
    }
}
