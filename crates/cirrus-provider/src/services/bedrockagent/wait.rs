//! Knowledge base status waiters

use cirrus_client::bedrockagent::{KnowledgeBase, KnowledgeBaseStatus};
use cirrus_client::BedrockAgentApi;
use std::time::Duration;

use super::find::find_knowledge_base_by_id;
use super::knowledge_base::RESOURCE_NAME;
use crate::conns::WaitSettings;
use crate::error::{ProviderError, Result};
use crate::waiter::StateChangeConf;

const CREATING: &str = KnowledgeBaseStatus::Creating.as_str();
const UPDATING: &str = KnowledgeBaseStatus::Updating.as_str();
const DELETING: &str = KnowledgeBaseStatus::Deleting.as_str();
const ACTIVE: &str = KnowledgeBaseStatus::Active.as_str();

async fn status_knowledge_base(conn: &dyn BedrockAgentApi, id: &str) -> Result<Option<(KnowledgeBase, String)>> {
    match find_knowledge_base_by_id(conn, id).await {
        Ok(kb) => {
            let status = kb.status.as_str().to_string();
            Ok(Some((kb, status)))
        }
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn failure_reasons(kb: &KnowledgeBase) -> Option<String> {
    (!kb.failure_reasons.is_empty()).then(|| kb.failure_reasons.join("; "))
}

async fn wait_for_active(
    conn: &dyn BedrockAgentApi,
    id: &str,
    pending: &str,
    timeout: Duration,
    settings: WaitSettings,
) -> Result<KnowledgeBase> {
    StateChangeConf::new(&[pending], &[ACTIVE], timeout)
        .with_settings(settings)
        .with_failure_reason(failure_reasons)
        .wait_for_state(move || status_knowledge_base(conn, id))
        .await?
        .ok_or_else(|| ProviderError::not_found(RESOURCE_NAME, id))
}

pub async fn wait_knowledge_base_created(
    conn: &dyn BedrockAgentApi,
    id: &str,
    timeout: Duration,
    settings: WaitSettings,
) -> Result<KnowledgeBase> {
    wait_for_active(conn, id, CREATING, timeout, settings).await
}

pub async fn wait_knowledge_base_updated(
    conn: &dyn BedrockAgentApi,
    id: &str,
    timeout: Duration,
    settings: WaitSettings,
) -> Result<KnowledgeBase> {
    wait_for_active(conn, id, UPDATING, timeout, settings).await
}

pub async fn wait_knowledge_base_deleted(
    conn: &dyn BedrockAgentApi,
    id: &str,
    timeout: Duration,
    settings: WaitSettings,
) -> Result<()> {
    StateChangeConf::new(&[DELETING], &[], timeout)
        .with_settings(settings)
        .with_failure_reason(failure_reasons)
        .wait_for_state(move || status_knowledge_base(conn, id))
        .await?;
    Ok(())
}
