//! Single resource instance lifecycle
//!
//! [`Lifecycle`] moves one instance between its prior state and its desired
//! configuration: refresh, plan, apply, import and destroy. It knows nothing
//! about how state is persisted.

use cirrus_core::{PlanAction, PlanResult};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::dynamic::DynResource;
use crate::error::{ProviderError, Result};

/// Drives one resource instance
pub struct Lifecycle<'a> {
    resource: &'a DynResource,
    address: String,
}

impl<'a> Lifecycle<'a> {
    pub fn new(resource: &'a DynResource, address: impl Into<String>) -> Self {
        Self {
            resource,
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn id_of<'s>(&self, state: &'s JsonValue) -> Result<&'s str> {
        self.resource
            .state_id(state)
            .ok_or_else(|| ProviderError::State(format!("{}: state has no id", self.address)))
    }

    /// Re-read the remote object; `None` when it no longer exists
    pub async fn refresh(&self, prior: &JsonValue) -> Result<Option<JsonValue>> {
        let id = self.id_of(prior)?;
        match self.resource.read(id, Some(prior)).await {
            Ok(state) => Ok(Some(state)),
            Err(e) if e.is_not_found() => {
                warn!(address = %self.address, id, "{} not found, removing from state", self.resource.display_name());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn plan(&self, prior: Option<&JsonValue>, config: Option<&JsonValue>) -> Result<PlanResult> {
        self.resource.plan(prior, config)
    }

    /// Carry out `plan`; returns the new state, `None` once deleted
    pub async fn apply(
        &self,
        prior: Option<&JsonValue>,
        config: Option<&JsonValue>,
        plan: &PlanResult,
    ) -> Result<Option<JsonValue>> {
        match plan.action {
            PlanAction::NoOp => Ok(prior.cloned()),
            PlanAction::Create => {
                let config = self.require_config(config)?;
                let state = self.resource.create(config).await?;
                info!(address = %self.address, id = ?self.resource.state_id(&state), "created");
                Ok(Some(state))
            }
            PlanAction::Update => {
                let prior = self.require_prior(prior)?;
                let config = self.require_config(config)?;
                let state = self.resource.update(prior, config, &plan.changes).await?;
                info!(address = %self.address, changes = plan.changes.len(), "updated");
                Ok(Some(state))
            }
            PlanAction::Replace => {
                let prior = self.require_prior(prior)?;
                let config = self.require_config(config)?;
                info!(address = %self.address, because = ?plan.replace_because, "replacing");
                self.resource.delete(prior).await?;
                let state = self.resource.create(config).await?;
                Ok(Some(state))
            }
            PlanAction::Delete => {
                let prior = self.require_prior(prior)?;
                self.destroy(prior).await?;
                Ok(None)
            }
        }
    }

    /// Read an existing remote object into a full state document
    pub async fn import(&self, id: &str) -> Result<JsonValue> {
        let state = self.resource.import(id).await?;
        info!(address = %self.address, id, "imported");
        Ok(state)
    }

    pub async fn destroy(&self, state: &JsonValue) -> Result<()> {
        self.resource.delete(state).await?;
        info!(address = %self.address, id = ?self.resource.state_id(state), "destroyed");
        Ok(())
    }

    fn require_config<'c>(&self, config: Option<&'c JsonValue>) -> Result<&'c JsonValue> {
        config.ok_or_else(|| ProviderError::State(format!("{}: no configuration to apply", self.address)))
    }

    fn require_prior<'p>(&self, prior: Option<&'p JsonValue>) -> Result<&'p JsonValue> {
        prior.ok_or_else(|| ProviderError::State(format!("{}: no prior state", self.address)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conns::Clients;
    use crate::registry::Provider;
    use cirrus_client::{MockBedrockAgent, MockCodeCommit};
    use serde_json::json;

    fn provider(mock: &MockCodeCommit) -> Provider {
        Provider::new(Clients::in_memory(mock.clone(), MockBedrockAgent::new())).unwrap()
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let mock = MockCodeCommit::new();
        let provider = provider(&mock);
        let resource = provider.resource("aws_codecommit_repository").unwrap();
        let lifecycle = Lifecycle::new(resource, "aws_codecommit_repository.test");

        let config = resource.validate(&json!({"repository_name": "demo"})).unwrap();
        let plan = lifecycle.plan(None, Some(&config)).unwrap();
        assert_eq!(plan.action, PlanAction::Create);
        let state = lifecycle.apply(None, Some(&config), &plan).await.unwrap().unwrap();
        assert_eq!(state["repository_name"], "demo");

        let changed = resource
            .validate(&json!({"repository_name": "demo", "description": "hello"}))
            .unwrap();
        let plan = lifecycle.plan(Some(&state), Some(&changed)).unwrap();
        assert_eq!(plan.action, PlanAction::Update);
        let state = lifecycle.apply(Some(&state), Some(&changed), &plan).await.unwrap().unwrap();
        assert_eq!(state["description"], "hello");

        let plan = lifecycle.plan(Some(&state), None).unwrap();
        assert_eq!(plan.action, PlanAction::Delete);
        assert!(lifecycle.apply(Some(&state), None, &plan).await.unwrap().is_none());
        assert_eq!(lifecycle.refresh(&state).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_apply_without_config_is_an_error() {
        let mock = MockCodeCommit::new();
        let provider = provider(&mock);
        let resource = provider.resource("aws_codecommit_repository").unwrap();
        let lifecycle = Lifecycle::new(resource, "aws_codecommit_repository.test");

        let plan = PlanResult {
            action: PlanAction::Create,
            ..PlanResult::noop()
        };
        let err = lifecycle.apply(None, None, &plan).await.unwrap_err();
        assert!(matches!(err, ProviderError::State(_)));
        assert!(mock.calls().is_empty());
    }
}
