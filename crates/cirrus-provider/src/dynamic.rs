//! Type-erased resource handlers
//!
//! Workspaces deal in raw JSON configurations and states. [`DynResource`]
//! validates raw configuration against the resource schema, converts it
//! into the handler's typed configuration, and dispatches to the typed
//! [`ResourceHandler`].

use async_trait::async_trait;
use cirrus_core::names::{ATTR_ID, ATTR_TAGS, ATTR_TAGS_ALL};
use cirrus_core::{AttributeMap, ChangeSet, PlanAction, PlanResult, Schema, SchemaValidator, ValidationErrorInfo};
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::conns::TagsContext;
use crate::error::{ProviderError, Result};
use crate::resource::{ResourceHandler, ResourceState};
use crate::tags::desired_tags_all;

#[async_trait]
trait ErasedResource: Send + Sync {
    fn canonical_config(&self, normalized: &JsonValue) -> Result<JsonValue>;

    async fn create(&self, config: &JsonValue) -> Result<JsonValue>;

    async fn read(&self, id: &str, prior: Option<&JsonValue>) -> Result<JsonValue>;

    async fn update(&self, prior: &JsonValue, config: &JsonValue, changes: &ChangeSet) -> Result<JsonValue>;

    fn moved(&self, prior: &JsonValue, id: &str) -> Result<Option<JsonValue>>;

    async fn delete(&self, state: &JsonValue) -> Result<()>;

    async fn import(&self, id: &str) -> Result<JsonValue>;
}

struct Erased<H>(H);

impl<H: ResourceHandler> Erased<H> {
    fn config(&self, value: &JsonValue) -> Result<H::Config> {
        serde_json::from_value(value.clone()).map_err(|e| ProviderError::Validation {
            resource: H::TYPE_NAME.to_string(),
            errors: vec![ValidationErrorInfo::new("(root)", e.to_string())],
        })
    }

    fn state(&self, value: &JsonValue) -> Result<H::State> {
        serde_json::from_value(value.clone()).map_err(|e| {
            ProviderError::State(format!("unreadable {} state: {}", H::TYPE_NAME, e))
        })
    }
}

fn to_json<S: ResourceState>(state: &S) -> Result<JsonValue> {
    Ok(serde_json::to_value(state)?)
}

#[async_trait]
impl<H: ResourceHandler> ErasedResource for Erased<H> {
    fn canonical_config(&self, normalized: &JsonValue) -> Result<JsonValue> {
        let config = self.config(normalized)?;
        let errors = self.0.validate(&config);
        if !errors.is_empty() {
            return Err(ProviderError::Validation {
                resource: H::TYPE_NAME.to_string(),
                errors,
            });
        }
        Ok(serde_json::to_value(&config)?)
    }

    async fn create(&self, config: &JsonValue) -> Result<JsonValue> {
        let config = self.config(config)?;
        to_json(&self.0.create(&config).await?)
    }

    async fn read(&self, id: &str, prior: Option<&JsonValue>) -> Result<JsonValue> {
        let prior = prior.map(|p| self.state(p)).transpose()?;
        to_json(&self.0.read(id, prior.as_ref()).await?)
    }

    async fn update(&self, prior: &JsonValue, config: &JsonValue, changes: &ChangeSet) -> Result<JsonValue> {
        let prior = self.state(prior)?;
        let config = self.config(config)?;
        to_json(&self.0.update(&prior, &config, changes).await?)
    }

    fn moved(&self, prior: &JsonValue, id: &str) -> Result<Option<JsonValue>> {
        let prior = self.state(prior)?;
        self.0.moved(&prior, id)?.as_ref().map(to_json).transpose()
    }

    async fn delete(&self, state: &JsonValue) -> Result<()> {
        let state = self.state(state)?;
        self.0.delete(&state).await
    }

    async fn import(&self, id: &str) -> Result<JsonValue> {
        to_json(&self.0.import(id).await?)
    }
}

/// A registered resource type, independent of its Rust types
#[derive(Clone)]
pub struct DynResource {
    inner: Arc<dyn ErasedResource>,
    schema: Arc<Schema>,
    validator: Arc<SchemaValidator>,
    type_name: &'static str,
    display_name: &'static str,
    tags: Option<TagsContext>,
}

impl std::fmt::Debug for DynResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynResource")
            .field("type_name", &self.type_name)
            .field("display_name", &self.display_name)
            .field("tags", &self.tags.is_some())
            .finish_non_exhaustive()
    }
}

impl DynResource {
    pub fn new<H: ResourceHandler>(handler: H) -> Result<Self> {
        let schema = H::schema();
        let validator = schema.validator()?;
        Ok(Self {
            inner: Arc::new(Erased(handler)),
            schema: Arc::new(schema),
            validator: Arc::new(validator),
            type_name: H::TYPE_NAME,
            display_name: H::DISPLAY_NAME,
            tags: None,
        })
    }

    /// Plan `tags_all` against provider default tags
    pub fn with_tags(mut self, ctx: TagsContext) -> Self {
        self.tags = Some(ctx);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn display_name(&self) -> &'static str {
        self.display_name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_taggable(&self) -> bool {
        self.tags.is_some()
    }

    /// Validate a raw configuration and return its canonical form
    ///
    /// Single-object blocks are wrapped into lists, nulls are dropped, and
    /// `""` optional strings are unset.
    pub fn validate(&self, raw: &JsonValue) -> Result<JsonValue> {
        let normalized = self.schema.normalize(raw);
        let result = self.validator.validate(&normalized);
        if !result.is_valid {
            return Err(ProviderError::Validation {
                resource: self.type_name.to_string(),
                errors: result.errors,
            });
        }
        self.inner.canonical_config(&normalized)
    }

    pub fn config_attributes(&self, canonical: &JsonValue) -> AttributeMap {
        AttributeMap::from_json(canonical)
    }

    pub fn state_attributes(&self, state: &JsonValue) -> AttributeMap {
        AttributeMap::from_json(state)
    }

    /// Identifier recorded in a state document
    pub fn state_id<'a>(&self, state: &'a JsonValue) -> Option<&'a str> {
        state.get(ATTR_ID).and_then(JsonValue::as_str)
    }

    /// Plan a prior state against a canonical configuration
    pub fn plan(&self, prior: Option<&JsonValue>, config: Option<&JsonValue>) -> Result<PlanResult> {
        let prior_attrs = prior.map(|p| self.state_attributes(p));
        let desired_attrs = config.map(|c| self.config_attributes(c));
        let mut result = cirrus_core::plan(&self.schema, prior_attrs.as_ref(), desired_attrs.as_ref());

        let (Some(ctx), Some(prior), Some(config)) = (&self.tags, &prior_attrs, config) else {
            return Ok(result);
        };
        if !matches!(result.action, PlanAction::NoOp | PlanAction::Update) {
            return Ok(result);
        }

        let configured: BTreeMap<String, String> = config
            .get(ATTR_TAGS)
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();
        let wanted = AttributeMap::from_json(&json!({
            ATTR_TAGS_ALL: desired_tags_all(ctx, &configured).into_map(),
        }));

        for change in prior.attribute(ATTR_TAGS_ALL).diff(&wanted) {
            result.changes.push(change);
        }
        if result.action == PlanAction::NoOp && !result.changes.is_empty() {
            result.action = PlanAction::Update;
        }
        Ok(result)
    }

    pub async fn create(&self, config: &JsonValue) -> Result<JsonValue> {
        self.inner.create(config).await
    }

    pub async fn read(&self, id: &str, prior: Option<&JsonValue>) -> Result<JsonValue> {
        self.inner.read(id, prior).await
    }

    pub async fn update(&self, prior: &JsonValue, config: &JsonValue, changes: &ChangeSet) -> Result<JsonValue> {
        self.inner.update(prior, config, changes).await
    }

    /// Prior state rewritten to an identifier a failed update moved it to
    pub fn moved(&self, prior: &JsonValue, id: &str) -> Result<Option<JsonValue>> {
        self.inner.moved(prior, id)
    }

    pub async fn delete(&self, state: &JsonValue) -> Result<()> {
        self.inner.delete(state).await
    }

    pub async fn import(&self, id: &str) -> Result<JsonValue> {
        self.inner.import(id).await
    }
}
