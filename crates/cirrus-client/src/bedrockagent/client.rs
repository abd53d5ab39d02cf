//! HTTP implementation of the Bedrock Agent API

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::types::*;
use super::BedrockAgentApi;
use crate::config::{BEDROCK_AGENT, ClientConfig};
use crate::error::Result;
use crate::tagging::ResourceTagger;
use crate::transport::{Empty, HttpTransport, RestRequest};

/// Signed Bedrock Agent client
#[derive(Debug, Clone)]
pub struct BedrockAgentClient {
    transport: HttpTransport,
}

impl BedrockAgentClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config, BEDROCK_AGENT)?,
        })
    }
}

#[async_trait]
impl BedrockAgentApi for BedrockAgentClient {
    async fn create_knowledge_base(&self, input: CreateKnowledgeBaseInput) -> Result<CreateKnowledgeBaseOutput> {
        let request = RestRequest::new("PUT", &["knowledgebases", ""]).json(&input)?;
        self.transport.call_rest("CreateKnowledgeBase", request).await
    }

    async fn get_knowledge_base(&self, knowledge_base_id: &str) -> Result<GetKnowledgeBaseOutput> {
        let request = RestRequest::new("GET", &["knowledgebases", knowledge_base_id]);
        self.transport.call_rest("GetKnowledgeBase", request).await
    }

    async fn update_knowledge_base(&self, input: UpdateKnowledgeBaseInput) -> Result<UpdateKnowledgeBaseOutput> {
        let request = RestRequest::new("PUT", &["knowledgebases", input.knowledge_base_id.as_str()]).json(&input)?;
        self.transport.call_rest("UpdateKnowledgeBase", request).await
    }

    async fn delete_knowledge_base(&self, knowledge_base_id: &str) -> Result<DeleteKnowledgeBaseOutput> {
        let request = RestRequest::new("DELETE", &["knowledgebases", knowledge_base_id]);
        self.transport.call_rest("DeleteKnowledgeBase", request).await
    }
}

#[async_trait]
impl ResourceTagger for BedrockAgentClient {
    async fn list_tags(&self, resource_arn: &str) -> Result<BTreeMap<String, String>> {
        let request = RestRequest::new("GET", &["tags", resource_arn]);
        let body: TagsBody = self.transport.call_rest("ListTagsForResource", request).await?;
        Ok(body.tags)
    }

    async fn tag_resource(&self, resource_arn: &str, tags: BTreeMap<String, String>) -> Result<()> {
        let request = RestRequest::new("POST", &["tags", resource_arn]).json(&TagsBody { tags })?;
        self.transport
            .call_rest::<Empty>("TagResource", request)
            .await?;
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<()> {
        let request = tag_keys
            .into_iter()
            .fold(RestRequest::new("DELETE", &["tags", resource_arn]), |req, key| {
                req.query("tagKeys", key)
            });
        self.transport
            .call_rest::<Empty>("UntagResource", request)
            .await?;
        Ok(())
    }
}
