//! Resource schemas and configuration validation
//!
//! A [`Schema`] describes the attributes and nested blocks of a resource type:
//! - whether each attribute is required, optional, computed or optional+computed
//! - whether changing it forces replacement
//! - value validators (length, enumeration, pattern, ARN, integer range)
//!
//! Schemas are converted to JSON Schema and compiled once; configurations are
//! validated against the compiled form before any remote call is made.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result, ValidationErrorInfo};

/// Loose ARN shape: `arn:partition:service:region:account:resource`
pub const ARN_PATTERN: &str = r"^arn:[a-z0-9-]+:[a-z0-9-]+:[a-z0-9-]*:[0-9]*:.+$";

/// Durations such as `30m` or `1h 30m`
pub const DURATION_PATTERN: &str = r"^([0-9]+(ns|us|ms|s|m|h|d)\s*)+$";

/// Value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    Bool,
    Float,
    StringList,
    StringMap,
}

/// Value constraint attached to an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Validator {
    LengthBetween { min: usize, max: usize },
    OneOf { values: Vec<String> },
    Pattern { pattern: String },
    Arn,
    Duration,
    IntBetween { min: i64, max: i64 },
}

impl Validator {
    pub fn length_between(min: usize, max: usize) -> Self {
        Validator::LengthBetween { min, max }
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Validator::OneOf {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Validator::Pattern {
            pattern: pattern.into(),
        }
    }

    fn apply(&self, schema: &mut Map<String, JsonValue>) {
        match self {
            Validator::LengthBetween { min, max } => {
                schema.insert("minLength".into(), json!(min));
                schema.insert("maxLength".into(), json!(max));
            }
            Validator::OneOf { values } => {
                schema.insert("enum".into(), json!(values));
            }
            Validator::Pattern { pattern } => {
                schema.insert("pattern".into(), json!(pattern));
            }
            Validator::Arn => {
                schema.insert("pattern".into(), json!(ARN_PATTERN));
            }
            Validator::Duration => {
                schema.insert("pattern".into(), json!(DURATION_PATTERN));
            }
            Validator::IntBetween { min, max } => {
                schema.insert("minimum".into(), json!(min));
                schema.insert("maximum".into(), json!(max));
            }
        }
    }
}

/// A single attribute of a resource or nested block
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub requires_replace: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl Attribute {
    fn of(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            requires_replace: false,
            description: None,
            validators: Vec::new(),
        }
    }

    pub fn required_string() -> Self {
        Self {
            required: true,
            ..Self::of(AttributeType::String)
        }
    }

    pub fn optional_string() -> Self {
        Self {
            optional: true,
            ..Self::of(AttributeType::String)
        }
    }

    pub fn computed_string() -> Self {
        Self {
            computed: true,
            ..Self::of(AttributeType::String)
        }
    }

    pub fn optional_computed_string() -> Self {
        Self {
            optional: true,
            computed: true,
            ..Self::of(AttributeType::String)
        }
    }

    pub fn optional_int() -> Self {
        Self {
            optional: true,
            ..Self::of(AttributeType::Int)
        }
    }

    pub fn computed_string_list() -> Self {
        Self {
            computed: true,
            ..Self::of(AttributeType::StringList)
        }
    }

    /// User-managed resource tags
    pub fn tags() -> Self {
        Self {
            optional: true,
            ..Self::of(AttributeType::StringMap)
        }
    }

    /// Effective tags including provider defaults
    pub fn tags_all() -> Self {
        Self {
            computed: true,
            ..Self::of(AttributeType::StringMap)
        }
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set by the remote side only, never accepted from configuration
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    fn to_json_schema(&self) -> JsonValue {
        let mut schema = Map::new();
        match self.attr_type {
            AttributeType::String => {
                schema.insert("type".into(), json!("string"));
            }
            AttributeType::Int => {
                schema.insert("type".into(), json!("integer"));
            }
            AttributeType::Bool => {
                schema.insert("type".into(), json!("boolean"));
            }
            AttributeType::Float => {
                schema.insert("type".into(), json!("number"));
            }
            AttributeType::StringList => {
                schema.insert("type".into(), json!("array"));
                schema.insert("items".into(), json!({ "type": "string" }));
            }
            AttributeType::StringMap => {
                schema.insert("type".into(), json!("object"));
                schema.insert("additionalProperties".into(), json!({ "type": "string" }));
            }
        }
        if let Some(description) = &self.description {
            schema.insert("description".into(), json!(description));
        }
        for validator in &self.validators {
            validator.apply(&mut schema);
        }
        JsonValue::Object(schema)
    }
}

/// Nested configuration block with cardinality bounds
#[derive(Debug, Clone, Serialize)]
pub struct NestedBlock {
    pub block: Block,
    pub min_items: usize,
    pub max_items: usize,
    pub requires_replace: bool,
    /// Affects only how the provider behaves, never sent to the remote API
    pub local_only: bool,
}

impl NestedBlock {
    pub fn required(block: Block) -> Self {
        Self {
            block,
            min_items: 1,
            max_items: 1,
            requires_replace: false,
            local_only: false,
        }
    }

    pub fn optional(block: Block) -> Self {
        Self {
            min_items: 0,
            ..Self::required(block)
        }
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn local_only(mut self) -> Self {
        self.local_only = true;
        self
    }

    fn to_json_schema(&self) -> JsonValue {
        json!({
            "type": "array",
            "minItems": self.min_items,
            "maxItems": self.max_items,
            "items": self.block.to_json_schema(),
        })
    }
}

/// A set of attributes and nested blocks
#[derive(Debug, Clone, Default, Serialize)]
pub struct Block {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks: BTreeMap<String, NestedBlock>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    fn to_json_schema(&self) -> JsonValue {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for (name, attribute) in &self.attributes {
            if attribute.is_computed_only() {
                continue;
            }
            if attribute.required {
                required.push(name.clone());
            }
            properties.insert(name.clone(), attribute.to_json_schema());
        }

        for (name, nested) in &self.blocks {
            if nested.min_items > 0 {
                required.push(name.clone());
            }
            properties.insert(name.clone(), nested.to_json_schema());
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Drop nulls and wrap single-object blocks into one-element lists
    fn normalize(&self, value: &JsonValue) -> JsonValue {
        let JsonValue::Object(fields) = value else {
            return value.clone();
        };

        let normalized = fields
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(name, v)| {
                let value = match (self.blocks.get(name), v) {
                    (Some(nested), JsonValue::Object(_)) => {
                        JsonValue::Array(vec![nested.block.normalize(v)])
                    }
                    (Some(nested), JsonValue::Array(items)) => JsonValue::Array(
                        items.iter().map(|item| nested.block.normalize(item)).collect(),
                    ),
                    _ => v.clone(),
                };
                (name.clone(), value)
            })
            .collect();

        JsonValue::Object(normalized)
    }
}

/// Schema of a resource type
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub version: i64,
    #[serde(flatten)]
    pub block: Block,
}

impl Schema {
    /// Start a version 0 schema
    pub fn v0() -> Self {
        Self {
            version: 0,
            block: Block::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.block = self.block.with_attribute(name, attribute);
        self
    }

    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.block = self.block.with_block(name, block);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.get(name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block.blocks.get(name)
    }

    /// Whether `name` is a top-level attribute or block of this schema
    pub fn is_known(&self, name: &str) -> bool {
        self.attribute(name).is_some() || self.nested_block(name).is_some()
    }

    /// Whether changing the top-level attribute or block forces replacement
    pub fn requires_replace(&self, name: &str) -> bool {
        match (self.attribute(name), self.nested_block(name)) {
            (Some(attribute), _) => attribute.requires_replace,
            (None, Some(nested)) => nested.requires_replace,
            _ => false,
        }
    }

    pub fn is_computed_only(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(Attribute::is_computed_only)
    }

    pub fn is_optional_computed(&self, name: &str) -> bool {
        self.attribute(name)
            .is_some_and(|a| a.optional && a.computed)
    }

    pub fn is_local_only(&self, name: &str) -> bool {
        self.nested_block(name).is_some_and(|b| b.local_only)
    }

    /// JSON Schema accepted for configurations of this resource type
    pub fn to_json_schema(&self) -> JsonValue {
        let mut schema = self.block.to_json_schema();
        if let JsonValue::Object(map) = &mut schema {
            map.insert(
                "$schema".into(),
                json!("http://json-schema.org/draft-07/schema#"),
            );
        }
        schema
    }

    /// Canonical form of a user configuration, ready for validation
    pub fn normalize(&self, config: &JsonValue) -> JsonValue {
        self.block.normalize(config)
    }

    /// Compile this schema for repeated validation
    pub fn validator(&self) -> Result<SchemaValidator> {
        SchemaValidator::new(self)
    }
}

/// Result of schema validation
#[derive(Debug)]
pub struct ValidationResult {
    /// Whether the configuration is valid
    pub is_valid: bool,
    /// Validation errors
    pub errors: Vec<ValidationErrorInfo>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
        }
    }

    pub fn failure(errors: Vec<ValidationErrorInfo>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }

    /// Convert into a `Result`, failing with every collected error
    pub fn into_result(self) -> Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(CoreError::Validation {
                errors: self.errors,
            })
        }
    }
}

/// Schema validator with cached compiled schema
pub struct SchemaValidator {
    compiled: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl SchemaValidator {
    pub fn new(schema: &Schema) -> Result<Self> {
        let json_schema = schema.to_json_schema();

        let compiled =
            jsonschema::validator_for(&json_schema).map_err(|e| CoreError::InvalidSchema {
                message: e.to_string(),
            })?;

        Ok(Self { compiled })
    }

    /// Validate a normalized configuration
    pub fn validate(&self, config: &JsonValue) -> ValidationResult {
        if self.compiled.is_valid(config) {
            return ValidationResult::success();
        }

        let errors: Vec<ValidationErrorInfo> = self
            .compiled
            .iter_errors(config)
            .map(|e| {
                let path = e.instance_path.to_string();
                ValidationErrorInfo::new(
                    if path.is_empty() {
                        "(root)".to_string()
                    } else {
                        path
                    },
                    format_validation_error(&e),
                )
            })
            .collect();

        ValidationResult::failure(errors)
    }
}

fn format_validation_error(error: &jsonschema::ValidationError) -> String {
    error.to_string().replace('"', "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository_like() -> Schema {
        Schema::v0()
            .with_attribute(
                "repository_name",
                Attribute::required_string().with_validator(Validator::length_between(0, 100)),
            )
            .with_attribute(
                "description",
                Attribute::optional_string().with_validator(Validator::length_between(0, 1000)),
            )
            .with_attribute("kms_key_id", Attribute::optional_computed_string())
            .with_attribute("arn", Attribute::computed_string())
            .with_attribute("tags", Attribute::tags())
            .with_attribute("tags_all", Attribute::tags_all())
    }

    fn storage_like() -> Schema {
        Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_block(
                "storage_configuration",
                NestedBlock::required(
                    Block::new()
                        .with_attribute(
                            "type",
                            Attribute::required_string()
                                .with_validator(Validator::one_of(["RDS", "PINECONE"])),
                        )
                        .with_attribute(
                            "resource_arn",
                            Attribute::optional_string().with_validator(Validator::Arn),
                        ),
                )
                .requires_replace(),
            )
            .with_block(
                "timeouts",
                NestedBlock::optional(
                    Block::new().with_attribute(
                        "create",
                        Attribute::optional_string().with_validator(Validator::Duration),
                    ),
                )
                .local_only(),
            )
    }

    #[test]
    fn test_to_json_schema_omits_computed_only() {
        let schema = repository_like().to_json_schema();

        assert!(schema["properties"]["repository_name"].is_object());
        assert!(schema["properties"]["kms_key_id"].is_object());
        assert!(schema["properties"]["arn"].is_null());
        assert!(schema["properties"]["tags_all"].is_null());
        assert_eq!(schema["required"], json!(["repository_name"]));
        assert_eq!(schema["properties"]["description"]["maxLength"], json!(1000));
    }

    #[test]
    fn test_validation_success() {
        let validator = repository_like().validator().unwrap();
        let result = validator.validate(&json!({
            "repository_name": "test",
            "tags": { "k1": "v1" },
        }));
        assert!(result.is_valid);
    }

    #[test]
    fn test_validation_failures() {
        let validator = repository_like().validator().unwrap();

        let too_long = "x".repeat(101);
        let result = validator.validate(&json!({ "repository_name": too_long }));
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].path, "/repository_name");

        let result = validator.validate(&json!({ "description": "missing name" }));
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].path, "(root)");

        let result = validator.validate(&json!({
            "repository_name": "test",
            "arn": "arn:aws:codecommit:us-east-1:123456789012:test",
        }));
        assert!(!result.is_valid, "computed-only attributes are rejected");
    }

    #[test]
    fn test_blocks_normalize_and_validate() {
        let schema = storage_like();
        let validator = schema.validator().unwrap();

        let config = schema.normalize(&json!({
            "name": "kb",
            "storage_configuration": {
                "type": "RDS",
                "resource_arn": "arn:aws:rds:us-west-2:123456789012:cluster:kb",
            },
            "timeouts": null,
        }));

        assert_eq!(config["storage_configuration"][0]["type"], json!("RDS"));
        assert!(config.get("timeouts").is_none());
        assert!(validator.validate(&config).is_valid);

        let bad = schema.normalize(&json!({
            "name": "kb",
            "storage_configuration": { "type": "MONGO", "resource_arn": "not-an-arn" },
        }));
        let result = validator.validate(&bad);
        assert_eq!(result.errors.len(), 2);
        assert!(
            result
                .errors
                .iter()
                .all(|e| e.path.starts_with("/storage_configuration/0/"))
        );
    }

    #[test]
    fn test_durations() {
        let schema = storage_like();
        let validator = schema.validator().unwrap();
        let config = |create: &str| {
            schema.normalize(&json!({
                "name": "kb",
                "storage_configuration": { "type": "RDS" },
                "timeouts": { "create": create },
            }))
        };

        assert!(validator.validate(&config("30m")).is_valid);
        assert!(validator.validate(&config("1h 30m")).is_valid);
        assert!(!validator.validate(&config("soon")).is_valid);
    }

    #[test]
    fn test_schema_lookups() {
        let schema = storage_like();
        assert!(schema.requires_replace("storage_configuration"));
        assert!(!schema.requires_replace("name"));
        assert!(schema.is_local_only("timeouts"));
        assert!(schema.is_known("name"));
        assert!(!schema.is_known("arn"));

        let repo = repository_like();
        assert!(repo.is_computed_only("arn"));
        assert!(repo.is_optional_computed("kms_key_id"));
        assert!(!repo.is_computed_only("kms_key_id"));
    }
}
