//! Workspace: configuration, provider and state store together
//!
//! A [`Workspace`] plans every configured or stored resource instance and
//! applies the result, persisting state after each instance so that a
//! failure part way through keeps what was already done.

use cirrus_core::{AttributeChange, PlanAction, PlanResult};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::check;
use crate::config::{Configuration, ResourceBlock};
use crate::dynamic::DynResource;
use crate::error::{ProviderError, Result};
use crate::lifecycle::Lifecycle;
use crate::registry::Provider;
use crate::storage::{StateStore, StoredInstance, parse_address};

/// Planned action for one instance
#[derive(Debug, Clone, Serialize)]
pub struct PlannedChange {
    pub address: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(flatten)]
    pub result: PlanResult,
}

impl PlannedChange {
    pub fn action(&self) -> PlanAction {
        self.result.action
    }
}

/// Number of instances per action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanCounts {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
}

/// Plan of a whole workspace, ordered by address
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
}

impl Plan {
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| !c.result.is_noop())
    }

    /// Changes that do something
    pub fn actionable(&self) -> impl Iterator<Item = &PlannedChange> {
        self.changes.iter().filter(|c| !c.result.is_noop())
    }

    pub fn get(&self, address: &str) -> Option<&PlannedChange> {
        self.changes.iter().find(|c| c.address == address)
    }

    pub fn counts(&self) -> PlanCounts {
        let mut counts = PlanCounts::default();
        for change in &self.changes {
            match change.action() {
                PlanAction::Create => counts.create += 1,
                PlanAction::Update => counts.update += 1,
                PlanAction::Replace => counts.replace += 1,
                PlanAction::Delete => counts.delete += 1,
                PlanAction::NoOp => {}
            }
        }
        counts
    }

    /// One line summary, e.g. `Plan: 1 to create, 0 to update, 0 to replace, 0 to destroy.`
    pub fn summary(&self) -> String {
        if !self.has_changes() {
            return "No changes.".to_string();
        }
        let c = self.counts();
        format!(
            "Plan: {} to create, {} to update, {} to replace, {} to destroy.",
            c.create, c.update, c.replace, c.delete
        )
    }
}

/// Remote drift of one stored instance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Drift {
    InSync,
    Changed { changes: Vec<AttributeChange> },
    Gone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftReport {
    pub address: String,
    pub id: String,
    #[serde(flatten)]
    pub drift: Drift,
}

/// Validated configuration and stored state, keyed by address
struct Snapshot<'c> {
    desired: BTreeMap<String, (&'c ResourceBlock, JsonValue)>,
    stored: BTreeMap<String, StoredInstance>,
}

pub struct Workspace<S: StateStore> {
    provider: Provider,
    store: S,
}

impl<S: StateStore> Workspace<S> {
    pub fn new(provider: Provider, store: S) -> Self {
        Self { provider, store }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate every resource block; canonical configurations by address
    pub fn validate(&self, config: &Configuration) -> Result<BTreeMap<String, JsonValue>> {
        Ok(self
            .validate_blocks(config)?
            .into_iter()
            .map(|(address, (_, canonical))| (address, canonical))
            .collect())
    }

    fn validate_blocks<'c>(
        &self,
        config: &'c Configuration,
    ) -> Result<BTreeMap<String, (&'c ResourceBlock, JsonValue)>> {
        let mut desired = BTreeMap::new();
        for block in &config.resources {
            let resource = self.provider.resource(&block.resource_type)?;
            let canonical = resource.validate(&block.config)?;
            desired.insert(block.address(), (block, canonical));
        }
        Ok(desired)
    }

    async fn snapshot<'c>(&self, config: &'c Configuration) -> Result<Snapshot<'c>> {
        let desired = self.validate_blocks(config)?;
        let stored = self
            .store
            .list()
            .await?
            .into_iter()
            .map(|instance| (instance.address(), instance))
            .collect();
        Ok(Snapshot { desired, stored })
    }

    fn resource_for(&self, address: &str) -> Result<&DynResource> {
        let (resource_type, _) = parse_address(address)
            .ok_or_else(|| ProviderError::State(format!("invalid address '{}'", address)))?;
        self.provider.resource(resource_type)
    }

    fn plan_snapshot(&self, snapshot: &Snapshot<'_>) -> Result<Plan> {
        let addresses: BTreeSet<&String> = snapshot.desired.keys().chain(snapshot.stored.keys()).collect();

        let mut changes = Vec::with_capacity(addresses.len());
        for address in addresses {
            let resource = self.resource_for(address)?;
            let prior = snapshot.stored.get(address).map(|s| &s.attributes);
            let desired = snapshot.desired.get(address).map(|(_, canonical)| canonical);
            let result = Lifecycle::new(resource, address.as_str()).plan(prior, desired)?;
            debug!(address = %address, action = %result.action, "planned");

            let (resource_type, name) = parse_address(address).unwrap_or_default();
            changes.push(PlannedChange {
                address: address.clone(),
                resource_type: resource_type.to_string(),
                name: name.to_string(),
                result,
            });
        }
        Ok(Plan { changes })
    }

    pub async fn plan(&self, config: &Configuration) -> Result<Plan> {
        let snapshot = self.snapshot(config).await?;
        self.plan_snapshot(&snapshot)
    }

    /// Plan and carry out every change; returns the executed plan
    pub async fn apply(&self, config: &Configuration) -> Result<Plan> {
        let snapshot = self.snapshot(config).await?;
        let plan = self.plan_snapshot(&snapshot)?;

        for change in plan.actionable() {
            let resource = self.resource_for(&change.address)?;
            let stored = snapshot.stored.get(&change.address);
            let prior = stored.map(|s| &s.attributes);
            let desired = snapshot.desired.get(&change.address).map(|(_, canonical)| canonical);

            let applied = Lifecycle::new(resource, change.address.as_str())
                .apply(prior, desired, &change.result)
                .await;
            match applied {
                Ok(state) => self.persist(resource, &change.address, stored.cloned(), state).await?,
                Err(e) => {
                    if let Err(persist_err) = self.persist_moved(resource, &change.address, stored, &e).await {
                        warn!(address = %change.address, error = %persist_err, "cannot record moved identifier");
                    }
                    return Err(e);
                }
            }
        }

        info!(summary = %plan.summary(), "apply complete");
        Ok(plan)
    }

    /// Keep state pointing at the remote object when a failed update had
    /// already moved its identifier
    async fn persist_moved(
        &self,
        resource: &DynResource,
        address: &str,
        stored: Option<&StoredInstance>,
        err: &ProviderError,
    ) -> Result<()> {
        let (ProviderError::PartialUpdate { id, .. }, Some(stored)) = (err, stored) else {
            return Ok(());
        };
        if *id == stored.id {
            return Ok(());
        }
        let Some(moved) = resource.moved(&stored.attributes, id)? else {
            return Ok(());
        };

        warn!(address, from = %stored.id, to = %id, "update failed after the identifier moved");
        self.persist(resource, address, Some(stored.clone()), Some(moved)).await
    }

    async fn persist(
        &self,
        resource: &DynResource,
        address: &str,
        stored: Option<StoredInstance>,
        state: Option<JsonValue>,
    ) -> Result<()> {
        let Some(state) = state else {
            self.store.remove(address).await?;
            return Ok(());
        };

        let id = resource
            .state_id(&state)
            .ok_or_else(|| ProviderError::State(format!("{}: state has no id", address)))?
            .to_string();
        let instance = match stored {
            Some(existing) => existing.updated(id, state),
            None => {
                let (resource_type, name) = parse_address(address).unwrap_or_default();
                StoredInstance::new(resource_type, name, id, resource.schema().version, state)
            }
        };
        self.store.put(instance).await
    }

    /// Take an existing remote object under management
    pub async fn import(&self, config: &Configuration, address: &str, id: &str) -> Result<StoredInstance> {
        let block = config
            .resource(address)
            .ok_or_else(|| ProviderError::Config(format!("no resource block for {} in configuration", address)))?;
        if self.store.exists(address).await? {
            return Err(ProviderError::Config(format!("{} is already managed", address)));
        }

        let resource = self.provider.resource(&block.resource_type)?;
        let state = Lifecycle::new(resource, address).import(id).await?;
        let instance = StoredInstance::new(
            block.resource_type.clone(),
            block.name.clone(),
            id,
            resource.schema().version,
            state,
        );
        self.store.put(instance.clone()).await?;
        Ok(instance)
    }

    async fn read_all(&self) -> Result<Vec<(StoredInstance, Option<JsonValue>)>> {
        let stored = self.store.list().await?;
        let reads = stored.into_iter().map(|instance| async move {
            let address = instance.address();
            let resource = self.resource_for(&address)?;
            let refreshed = Lifecycle::new(resource, address).refresh(&instance.attributes).await?;
            Ok::<_, ProviderError>((instance, refreshed))
        });
        try_join_all(reads).await
    }

    /// Compare stored state with the remote side without writing anything
    pub async fn drift(&self) -> Result<Vec<DriftReport>> {
        let reads = self.read_all().await?;
        Ok(reads
            .iter()
            .map(|(instance, refreshed)| drift_report(self, instance, refreshed.as_ref()))
            .collect())
    }

    /// Re-read every stored instance and write the result back
    pub async fn refresh(&self) -> Result<Vec<DriftReport>> {
        let reads = self.read_all().await?;
        let mut reports = Vec::with_capacity(reads.len());

        for (instance, refreshed) in reads {
            reports.push(drift_report(self, &instance, refreshed.as_ref()));
            let address = instance.address();
            match refreshed {
                Some(state) if state != instance.attributes => {
                    let id = instance.id.clone();
                    self.store.put(instance.updated(id, state)).await?;
                }
                Some(_) => {}
                None => {
                    self.store.remove(&address).await?;
                }
            }
        }
        Ok(reports)
    }

    /// Delete every stored instance; returns the destroyed addresses
    pub async fn destroy(&self) -> Result<Vec<String>> {
        let mut destroyed = Vec::new();
        for instance in self.store.list().await? {
            let address = instance.address();
            let resource = self.resource_for(&address)?;
            Lifecycle::new(resource, address.as_str())
                .destroy(&instance.attributes)
                .await?;
            self.store.remove(&address).await?;
            destroyed.push(address);
        }
        Ok(destroyed)
    }
}

fn drift_report<S: StateStore>(
    workspace: &Workspace<S>,
    instance: &StoredInstance,
    refreshed: Option<&JsonValue>,
) -> DriftReport {
    let drift = match refreshed {
        None => Drift::Gone,
        Some(state) => {
            let changes = match workspace.resource_for(&instance.address()) {
                Ok(resource) => check::drift(
                    &resource.state_attributes(&instance.attributes),
                    &resource.state_attributes(state),
                ),
                Err(_) => Vec::new(),
            };
            if changes.is_empty() {
                Drift::InSync
            } else {
                Drift::Changed { changes }
            }
        }
    };
    DriftReport {
        address: instance.address(),
        id: instance.id.clone(),
        drift,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conns::Clients;
    use crate::storage::MemoryStateStore;
    use cirrus_client::{MockBedrockAgent, MockCodeCommit};

    const CONFIG: &str = r#"
resources:
  - type: aws_codecommit_repository
    name: app
    config:
      repository_name: app
      description: application code
"#;

    fn workspace(mock: &MockCodeCommit) -> Workspace<MemoryStateStore> {
        let clients = Clients::in_memory(mock.clone(), MockBedrockAgent::new());
        Workspace::new(Provider::new(clients).unwrap(), MemoryStateStore::new())
    }

    #[tokio::test]
    async fn test_apply_then_plan_is_empty() {
        let mock = MockCodeCommit::new();
        let ws = workspace(&mock);
        let config = Configuration::from_yaml(CONFIG).unwrap();

        let plan = ws.plan(&config).await.unwrap();
        assert_eq!(plan.summary(), "Plan: 1 to create, 0 to update, 0 to replace, 0 to destroy.");

        ws.apply(&config).await.unwrap();
        assert_eq!(ws.store().addresses(), vec!["aws_codecommit_repository.app"]);
        assert!(mock.repository("app").is_some());

        let plan = ws.plan(&config).await.unwrap();
        assert!(!plan.has_changes());
        assert_eq!(plan.summary(), "No changes.");
    }

    #[tokio::test]
    async fn test_removed_block_is_deleted() {
        let mock = MockCodeCommit::new();
        let ws = workspace(&mock);
        ws.apply(&Configuration::from_yaml(CONFIG).unwrap()).await.unwrap();

        let plan = ws.apply(&Configuration::default()).await.unwrap();
        assert_eq!(plan.counts().delete, 1);
        assert!(ws.store().is_empty());
        assert!(mock.repository("app").is_none());
    }

    #[tokio::test]
    async fn test_refresh_drops_vanished_instances() {
        let mock = MockCodeCommit::new();
        let ws = workspace(&mock);
        ws.apply(&Configuration::from_yaml(CONFIG).unwrap()).await.unwrap();

        mock.set_description_out_of_band("app", Some("edited"));
        let drift = ws.drift().await.unwrap();
        match &drift[0].drift {
            Drift::Changed { changes } => assert_eq!(changes[0].path, "description"),
            other => panic!("unexpected drift: {other:?}"),
        }

        mock.delete_out_of_band("app");
        let reports = ws.refresh().await.unwrap();
        assert_eq!(reports[0].drift, Drift::Gone);
        assert!(ws.store().is_empty());
    }

    #[tokio::test]
    async fn test_import_requires_block_and_unmanaged_address() {
        let mock = MockCodeCommit::new();
        let ws = workspace(&mock);
        let config = Configuration::from_yaml(CONFIG).unwrap();

        let err = ws.import(&config, "aws_codecommit_repository.other", "app").await.unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));

        ws.apply(&config).await.unwrap();
        let err = ws.import(&config, "aws_codecommit_repository.app", "app").await.unwrap_err();
        assert!(err.to_string().contains("already managed"));
    }
}
