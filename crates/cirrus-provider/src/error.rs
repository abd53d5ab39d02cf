//! Error types for cirrus-provider

use cirrus_client::ClientError;
use cirrus_core::{CoreError, ValidationErrorInfo};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// The operation a resource error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrAction {
    Creating,
    Reading,
    Updating,
    Deleting,
    Importing,
    Tagging,
    ListingTags,
}

impl ErrAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrAction::Creating => "creating",
            ErrAction::Reading => "reading",
            ErrAction::Updating => "updating",
            ErrAction::Deleting => "deleting",
            ErrAction::Importing => "importing",
            ErrAction::Tagging => "updating tags for",
            ErrAction::ListingTags => "listing tags for",
        }
    }
}

impl fmt::Display for ErrAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while managing resources
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// Remote object does not exist
    #[error("{resource} ({id}) not found")]
    NotFound { resource: String, id: String },

    /// Remote object vanished between creation and the first read
    #[error("{resource} ({id}) not found after creation")]
    NewResourceNotFound { resource: String, id: String },

    /// Service call failed
    #[error("{action} {resource} ({id}): {source}")]
    Api {
        action: ErrAction,
        resource: String,
        id: String,
        #[source]
        source: ClientError,
    },

    /// A multi-call update stopped part way
    #[error("updating {resource} ({id}) {step}: {source}{}", applied_hint(.applied))]
    PartialUpdate {
        resource: String,
        id: String,
        step: String,
        applied: Vec<String>,
        #[source]
        source: ClientError,
    },

    /// Waiting for an asynchronous operation failed
    #[error("waiting for {resource} ({id}) {operation}: {source}")]
    Wait {
        resource: String,
        id: String,
        operation: &'static str,
        #[source]
        source: Box<ProviderError>,
    },

    /// Status never reached the target
    #[error("timeout while waiting for state to become '{}' (last state: '{last_status}', timeout: {}s)", .target.join(", "), .timeout.as_secs())]
    WaitTimeout {
        target: Vec<String>,
        last_status: String,
        timeout: Duration,
    },

    /// Status left the expected set
    #[error("unexpected state '{state}', wanted target '{}'{}", .expected.join(", "), reason_suffix(.reason))]
    UnexpectedState {
        state: String,
        expected: Vec<String>,
        reason: Option<String>,
    },

    /// Configuration rejected by the resource schema
    #[error("invalid configuration for {resource}:\n{}", format_validation(.errors))]
    Validation {
        resource: String,
        errors: Vec<ValidationErrorInfo>,
    },

    /// No resource registered under this type name
    #[error("unknown resource type '{0}'\nHint: Run `cirrus resources` to list supported types")]
    UnknownResourceType(String),

    /// Invalid provider or workspace configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// State store error
    #[error("state error: {0}")]
    State(String),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

fn applied_hint(applied: &[String]) -> String {
    if applied.is_empty() {
        String::new()
    } else {
        format!("\nHint: already applied before the failure: {}", applied.join(", "))
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(": {}", reason),
        None => String::new(),
    }
}

fn format_validation(errors: &[ValidationErrorInfo]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for ProviderError {
    fn from(e: serde_yaml::Error) -> Self {
        ProviderError::Serialization(e.to_string())
    }
}

impl ProviderError {
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        ProviderError::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn api(action: ErrAction, resource: impl Into<String>, id: impl Into<String>, source: ClientError) -> Self {
        ProviderError::Api {
            action,
            resource: resource.into(),
            id: id.into(),
            source,
        }
    }

    /// Check if this is the NotFound sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    /// Service error code carried by this error, if any
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ProviderError::Api { source, .. } | ProviderError::PartialUpdate { source, .. } => {
                source.error_code()
            }
            ProviderError::Client(e) => e.error_code(),
            ProviderError::Wait { source, .. } => source.error_code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let err = ProviderError::api(
            ErrAction::Reading,
            "CodeCommit Repository",
            "my-repo",
            ClientError::api("RepositoryDoesNotExistException", "my-repo does not exist"),
        );

        assert_eq!(
            err.to_string(),
            "reading CodeCommit Repository (my-repo): RepositoryDoesNotExistException: my-repo does not exist"
        );
        assert_eq!(err.error_code(), Some("RepositoryDoesNotExistException"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_partial_update_names_applied_steps() {
        let err = ProviderError::PartialUpdate {
            resource: "CodeCommit Repository".to_string(),
            id: "renamed".to_string(),
            step: "default branch".to_string(),
            applied: vec!["name".to_string()],
            source: ClientError::api("BranchDoesNotExistException", "no such branch"),
        };

        let message = err.to_string();
        assert!(message.starts_with("updating CodeCommit Repository (renamed) default branch:"));
        assert!(message.contains("already applied before the failure: name"));
    }

    #[test]
    fn test_wait_errors() {
        let timeout = ProviderError::WaitTimeout {
            target: vec!["ACTIVE".to_string()],
            last_status: "CREATING".to_string(),
            timeout: Duration::from_secs(60),
        };
        assert_eq!(
            timeout.to_string(),
            "timeout while waiting for state to become 'ACTIVE' (last state: 'CREATING', timeout: 60s)"
        );

        let failed = ProviderError::UnexpectedState {
            state: "FAILED".to_string(),
            expected: vec!["ACTIVE".to_string()],
            reason: Some("role cannot be assumed".to_string()),
        };
        assert_eq!(
            failed.to_string(),
            "unexpected state 'FAILED', wanted target 'ACTIVE': role cannot be assumed"
        );
    }
}
