//! Acceptance test harness
//!
//! Runs configuration steps against the in-memory services the same way
//! `cirrus apply` runs them against the real ones: refresh, plan, check the
//! planned action, apply, then require an empty follow-up plan.
//!
//! ```no_run
//! # async fn demo() -> Result<(), cirrus_provider::acctest::StepError> {
//! use cirrus_core::PlanAction;
//! use cirrus_provider::acctest::Harness;
//!
//! let mut harness = Harness::new();
//! let state = harness
//!     .step(
//!         r#"
//! resources:
//!   - type: aws_codecommit_repository
//!     name: test
//!     config:
//!       repository_name: demo
//! "#,
//!         "aws_codecommit_repository.test",
//!         PlanAction::Create,
//!     )
//!     .await?;
//! assert_eq!(state["repository_name"], "demo");
//! harness.destroy().await?;
//! # Ok(())
//! # }
//! ```

use cirrus_client::{MockBedrockAgent, MockCodeCommit};
use cirrus_core::{AttributeChange, PlanAction};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;

use crate::check::{self, CheckError};
use crate::config::Configuration;
use crate::conns::Clients;
use crate::error::ProviderError;
use crate::lifecycle::Lifecycle;
use crate::registry::Provider;
use crate::services::bedrockagent::KnowledgeBaseFinder;
use crate::services::codecommit::RepositoryFinder;
use crate::storage::{MemoryStateStore, StateStore, StoredInstance, parse_address};
use crate::workspace::{Plan, Workspace};

const CODECOMMIT_PREFIX: &str = "aws_codecommit_";
const BEDROCK_AGENT_PREFIX: &str = "aws_bedrockagent_";

#[derive(Debug, Error)]
pub enum StepError {
    #[error("{address}: expected plan to {expected}, got {actual}")]
    UnexpectedPlan {
        address: String,
        expected: PlanAction,
        actual: PlanAction,
    },

    #[error("{address}: plan not empty after apply ({action})")]
    NotConverged { address: String, action: PlanAction },

    #[error("{address}: no state")]
    NoState { address: String },

    #[error("{address}: imported state differs: {changes:?}")]
    ImportMismatch {
        address: String,
        changes: Vec<AttributeChange>,
    },

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type StepResult<T> = std::result::Result<T, StepError>;

pub struct Harness {
    pub codecommit: MockCodeCommit,
    pub bedrock_agent: MockBedrockAgent,
    clients: Clients,
    workspace: Workspace<MemoryStateStore>,
    config: Configuration,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_clients(|clients| clients)
    }

    /// Build with adjusted clients, e.g. provider default tags
    pub fn with_clients(adjust: impl FnOnce(Clients) -> Clients) -> Self {
        let codecommit = MockCodeCommit::new();
        let bedrock_agent = MockBedrockAgent::new();
        let clients = adjust(Clients::in_memory(codecommit.clone(), bedrock_agent.clone()));
        let provider = match Provider::new(clients.clone()) {
            Ok(provider) => provider,
            Err(e) => panic!("building provider: {e}"),
        };

        Self {
            codecommit,
            bedrock_agent,
            clients,
            workspace: Workspace::new(provider, MemoryStateStore::new()),
            config: Configuration::default(),
        }
    }

    pub fn workspace(&self) -> &Workspace<MemoryStateStore> {
        &self.workspace
    }

    pub fn store(&self) -> &MemoryStateStore {
        self.workspace.store()
    }

    /// Refresh and plan `yaml` without applying it
    pub async fn plan(&mut self, yaml: &str) -> StepResult<Plan> {
        self.config = Configuration::from_yaml(yaml)?;
        self.workspace.refresh().await?;
        Ok(self.workspace.plan(&self.config).await?)
    }

    /// Apply `yaml`, expecting `address` to plan `expected`; returns its state
    pub async fn step(&mut self, yaml: &str, address: &str, expected: PlanAction) -> StepResult<JsonValue> {
        let plan = self.plan(yaml).await?;
        let actual = plan.get(address).map(|c| c.action()).unwrap_or(PlanAction::NoOp);
        if actual != expected {
            return Err(StepError::UnexpectedPlan {
                address: address.to_string(),
                expected,
                actual,
            });
        }

        self.workspace.apply(&self.config).await?;
        self.expect_converged().await?;

        if expected == PlanAction::Delete {
            return Ok(JsonValue::Null);
        }
        Ok(self.instance(address).await?.attributes)
    }

    async fn expect_converged(&self) -> StepResult<()> {
        self.workspace.refresh().await?;
        let plan = self.workspace.plan(&self.config).await?;
        match plan.actionable().next() {
            Some(change) => Err(StepError::NotConverged {
                address: change.address.clone(),
                action: change.action(),
            }),
            None => Ok(()),
        }
    }

    pub async fn instance(&self, address: &str) -> StepResult<StoredInstance> {
        self.store()
            .get(address)
            .await?
            .ok_or_else(|| StepError::NoState {
                address: address.to_string(),
            })
    }

    /// Import `id` under `address` of the last planned configuration
    pub async fn import(&self, address: &str, id: &str) -> StepResult<StoredInstance> {
        Ok(self.workspace.import(&self.config, address, id).await?)
    }

    /// Drop `address` from state without touching the remote object
    pub async fn forget(&self, address: &str) -> StepResult<()> {
        self.store().remove(address).await?;
        Ok(())
    }

    /// Import `address` by its stored id and compare with the stored state
    ///
    /// Top-level attributes in `ignore` are left out of the comparison.
    pub async fn import_verify(&self, address: &str, ignore: &[&str]) -> StepResult<JsonValue> {
        let instance = self.instance(address).await?;
        let resource = self.workspace.provider().resource(&instance.resource_type)?;
        let imported = Lifecycle::new(resource, address).import(&instance.id).await?;

        let changes: Vec<AttributeChange> = check::drift(
            &resource.state_attributes(&instance.attributes),
            &resource.state_attributes(&imported),
        )
        .into_iter()
        .filter(|c| !ignore.contains(&c.attribute()))
        .collect();

        if !changes.is_empty() {
            return Err(StepError::ImportMismatch {
                address: address.to_string(),
                changes,
            });
        }
        Ok(imported)
    }

    /// Delete the remote object behind `address`, leaving state in place
    pub async fn disappear(&self, address: &str) -> StepResult<()> {
        let instance = self.instance(address).await?;
        let resource = self.workspace.provider().resource(&instance.resource_type)?;
        resource.delete(&instance.attributes).await?;
        Ok(())
    }

    /// Fail unless the remote object behind `address` exists
    pub async fn check_exists(&self, address: &str) -> StepResult<()> {
        let instance = self.instance(address).await?;
        if instance.resource_type.starts_with(CODECOMMIT_PREFIX) {
            let mut found = None;
            check::exists(&self.repository_finder(), &instance.id, &mut found).await?;
        } else {
            let mut found = None;
            check::exists(&self.knowledge_base_finder(), &instance.id, &mut found).await?;
        }
        Ok(())
    }

    /// Destroy everything in state and check the remote objects are gone
    pub async fn destroy(&mut self) -> StepResult<Vec<String>> {
        let stored = self.store().list().await?;
        let destroyed = self.workspace.destroy().await?;

        let ids = |prefix: &str| -> Vec<String> {
            stored
                .iter()
                .filter(|i| parse_address(&i.address()).is_some_and(|(t, _)| t.starts_with(prefix)))
                .map(|i| i.id.clone())
                .collect()
        };
        check::destroyed(&self.repository_finder(), ids(CODECOMMIT_PREFIX)).await?;
        check::destroyed(&self.knowledge_base_finder(), ids(BEDROCK_AGENT_PREFIX)).await?;

        self.config = Configuration::default();
        Ok(destroyed)
    }

    pub fn repository_finder(&self) -> RepositoryFinder {
        RepositoryFinder::new(Arc::clone(&self.clients.codecommit))
    }

    pub fn knowledge_base_finder(&self) -> KnowledgeBaseFinder {
        KnowledgeBaseFinder::new(Arc::clone(&self.clients.bedrock_agent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPO: &str = r#"
resources:
  - type: aws_codecommit_repository
    name: test
    config:
      repository_name: harness
"#;

    #[tokio::test]
    async fn test_step_reports_unexpected_plan() {
        let mut harness = Harness::new();
        harness
            .step(REPO, "aws_codecommit_repository.test", PlanAction::Create)
            .await
            .unwrap();

        let err = harness
            .step(REPO, "aws_codecommit_repository.test", PlanAction::Update)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "aws_codecommit_repository.test: expected plan to update, got no-op"
        );
    }

    #[tokio::test]
    async fn test_destroy_checks_remote() {
        let mut harness = Harness::new();
        harness
            .step(REPO, "aws_codecommit_repository.test", PlanAction::Create)
            .await
            .unwrap();
        harness.check_exists("aws_codecommit_repository.test").await.unwrap();

        let destroyed = harness.destroy().await.unwrap();
        assert_eq!(destroyed, vec!["aws_codecommit_repository.test"]);
        assert!(harness.codecommit.repository("harness").is_none());
    }
}
