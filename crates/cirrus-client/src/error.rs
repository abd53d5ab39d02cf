//! Error types for service calls

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by a service, classified by its error code
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// Error code without namespace, e.g. `RepositoryDoesNotExistException`
    pub code: String,
    pub message: String,
    /// HTTP status of the failed response
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: 400,
            request_id: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

/// Service client errors
#[derive(Debug, Error)]
pub enum ClientError {
    // ============ Service Errors ============
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    // ============ Network Errors ============
    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timeout")]
    Timeout,

    // ============ Configuration Errors ============
    #[error("Invalid client configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid endpoint URL: {url} - {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Credentials error: {message}")]
    Credentials { message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for service calls
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Shorthand for a service error with the given code
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Api(ApiError::new(code, message))
    }

    /// Service error code, if this is a service error
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ClientError::Api(e) => Some(&e.code),
            _ => None,
        }
    }

    pub fn is_code(&self, code: &str) -> bool {
        self.error_code() == Some(code)
    }

    /// Whether the service reported an error containing `fragment` in its message
    pub fn message_contains(&self, code: &str, fragment: &str) -> bool {
        match self {
            ClientError::Api(e) => e.code == code && e.message.contains(fragment),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_connect() {
            ClientError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            ClientError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            ClientError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for ClientError {
    fn from(e: serde_yaml::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::InvalidEndpoint {
            url: String::new(),
            reason: e.to_string(),
        }
    }
}
