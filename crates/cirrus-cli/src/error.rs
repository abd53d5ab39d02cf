//! CLI error types with exit code handling
//!
//! Every command returns [`CliError`]; `main` renders it with miette and
//! exits with the code of its variant.

use cirrus_provider::ProviderError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// A resource configuration was rejected
    #[error("Validation failed: {message}")]
    #[diagnostic(code(cirrus::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Workspace file or provider settings
    #[error("Configuration error: {message}")]
    #[diagnostic(code(cirrus::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("State error: {message}")]
    #[diagnostic(code(cirrus::cli::state))]
    State {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A service call or wait failed
    #[error("{message}")]
    #[diagnostic(code(cirrus::cli::provider))]
    Provider {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(cirrus::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(cirrus::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(cirrus::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::State { .. } => exit_codes::STATE_ERROR,
            CliError::Provider { .. } => exit_codes::PROVIDER_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn state_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<ProviderError> for CliError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Validation { resource, errors } => CliError::Validation {
                message: format!("{} error(s) in {} configuration", errors.len(), resource),
                help: Some(
                    errors
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
            },
            ProviderError::UnknownResourceType(type_name) => CliError::usage_with_help(
                format!("unknown resource type '{}'", type_name),
                "Run `cirrus resources` to list supported types",
            ),
            ProviderError::Config(message) => CliError::Config {
                message,
                help: Some("Check the workspace file passed with -f".to_string()),
            },
            ProviderError::State(message) => CliError::State {
                message,
                help: None,
            },
            ProviderError::Client(e) => CliError::Config {
                message: e.to_string(),
                help: Some(
                    "Set AWS_REGION and credentials, or configure them under `provider:`".to_string(),
                ),
            },
            ProviderError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            e @ ProviderError::PartialUpdate { .. } => CliError::Provider {
                message: e.to_string(),
                help: Some(
                    "Steps applied before the failure are not rolled back; run `cirrus plan` to see what remains"
                        .to_string(),
                ),
            },
            other => CliError::Provider {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
