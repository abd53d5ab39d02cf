//! Cirrus Core - Core types for cloud resource providers
//!
//! This crate provides the foundational types used throughout Cirrus:
//! - `Schema`: Resource attribute schemas and configuration validation
//! - `AttributeMap`: Flattened view of configurations and states
//! - `PlanResult`: Change detection between prior state and desired configuration
//! - `KeyValueTags`: Tag merging, ignoring and diffing
//! - `Timeouts`: Per-operation timeouts

pub mod arn;
pub mod attributes;
pub mod error;
pub mod names;
pub mod plan;
pub mod schema;
pub mod serde_ext;
pub mod tags;
pub mod timeouts;

pub use arn::Arn;
pub use attributes::{AttributeChange, AttributeMap};
pub use error::{CoreError, Result, ValidationErrorInfo};
pub use plan::{ChangeSet, PlanAction, PlanResult, plan};
pub use schema::{
    Attribute, AttributeType, Block, NestedBlock, Schema, SchemaValidator, ValidationResult,
    Validator,
};
pub use tags::{IgnoreConfig, KeyValueTags};
pub use timeouts::Timeouts;
