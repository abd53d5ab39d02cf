//! Attribute names shared across resource types

pub const ATTR_ID: &str = "id";
pub const ATTR_ARN: &str = "arn";
pub const ATTR_NAME: &str = "name";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_ROLE_ARN: &str = "role_arn";
pub const ATTR_TAGS: &str = "tags";
pub const ATTR_TAGS_ALL: &str = "tags_all";
pub const ATTR_TIMEOUTS: &str = "timeouts";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_CREATED_AT: &str = "created_at";
pub const ATTR_UPDATED_AT: &str = "updated_at";
pub const ATTR_FAILURE_REASONS: &str = "failure_reasons";
