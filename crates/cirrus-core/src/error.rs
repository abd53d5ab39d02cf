//! Core error types

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("Validation failed with {} error(s)", errors.len())]
    Validation { errors: Vec<ValidationErrorInfo> },

    #[error("Invalid ARN '{arn}': {message}")]
    InvalidArn { arn: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// A single validation failure, addressed by its JSON pointer path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrorInfo {
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ValidationErrorInfo {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

impl std::fmt::Display for ValidationErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
