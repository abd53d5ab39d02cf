//! Client configuration
//!
//! Region, endpoint overrides, credentials and request timeout shared by every
//! service client. Endpoints default to the public regional endpoint of each
//! service; overrides point a service at a local fake or a VPC endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::credentials::CredentialsSource;
use crate::error::{ClientError, Result};

/// Identity of a remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Service {
    /// Name used for endpoint overrides and logging
    pub name: &'static str,
    /// Host prefix of the regional endpoint
    pub endpoint_prefix: &'static str,
    /// Service name in the request signature scope
    pub signing_name: &'static str,
}

pub const CODECOMMIT: Service = Service {
    name: "codecommit",
    endpoint_prefix: "codecommit",
    signing_name: "codecommit",
};

pub const BEDROCK_AGENT: Service = Service {
    name: "bedrockagent",
    endpoint_prefix: "bedrock-agent",
    signing_name: "bedrock",
};

/// Configuration shared by all service clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Empty until resolved from the environment
    #[serde(default)]
    pub region: String,

    /// Endpoint overrides keyed by service name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub endpoints: BTreeMap<String, String>,

    #[serde(default)]
    pub credentials: CredentialsSource,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_user_agent() -> String {
    format!("cirrus/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoints: BTreeMap::new(),
            credentials: CredentialsSource::default(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }

    /// Build from the process environment
    ///
    /// Reads `AWS_REGION` (or `AWS_DEFAULT_REGION`) and per-service endpoint
    /// overrides such as `CIRRUS_ENDPOINT_CODECOMMIT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new(String::new());
        config.apply_lookup(lookup);
        if config.region.is_empty() {
            return Err(ClientConfig::missing_region());
        }
        Ok(config)
    }

    /// Fill an unset region and missing endpoint overrides from `lookup`
    ///
    /// Values already present in the configuration win.
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.region.is_empty() {
            if let Some(region) = lookup("AWS_REGION")
                .or_else(|| lookup("AWS_DEFAULT_REGION"))
                .filter(|r| !r.is_empty())
            {
                self.region = region;
            }
        }

        for service in [CODECOMMIT, BEDROCK_AGENT] {
            let var = format!("CIRRUS_ENDPOINT_{}", service.name.to_ascii_uppercase());
            if let Some(endpoint) = lookup(&var) {
                self.endpoints
                    .entry(service.name.to_string())
                    .or_insert(endpoint);
            }
        }
    }

    fn missing_region() -> ClientError {
        ClientError::InvalidConfig {
            message: "No region configured. Set AWS_REGION or the provider region".to_string(),
        }
    }

    pub fn with_endpoint(mut self, service: Service, url: impl Into<String>) -> Self {
        self.endpoints.insert(service.name.to_string(), url.into());
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialsSource) -> Self {
        self.credentials = credentials;
        self
    }

    /// Partition the configured region belongs to
    pub fn partition(&self) -> &'static str {
        if self.region.starts_with("cn-") {
            "aws-cn"
        } else if self.region.starts_with("us-gov-") {
            "aws-us-gov"
        } else {
            "aws"
        }
    }

    fn dns_suffix(&self) -> &'static str {
        match self.partition() {
            "aws-cn" => "amazonaws.com.cn",
            _ => "amazonaws.com",
        }
    }

    /// Resolve the base URL of a service
    pub fn endpoint_for(&self, service: Service) -> Result<Url> {
        if self.region.is_empty() {
            return Err(Self::missing_region());
        }

        let raw = match self.endpoints.get(service.name) {
            Some(url) => url.clone(),
            None => format!(
                "https://{}.{}.{}",
                service.endpoint_prefix,
                self.region,
                self.dns_suffix()
            ),
        };

        Url::parse(&raw).map_err(|e| ClientError::InvalidEndpoint {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let config = ClientConfig::new("us-west-2");
        assert_eq!(
            config.endpoint_for(CODECOMMIT).unwrap().as_str(),
            "https://codecommit.us-west-2.amazonaws.com/"
        );
        assert_eq!(
            config.endpoint_for(BEDROCK_AGENT).unwrap().as_str(),
            "https://bedrock-agent.us-west-2.amazonaws.com/"
        );
        assert_eq!(config.partition(), "aws");
    }

    #[test]
    fn test_endpoint_override_and_partition() {
        let config = ClientConfig::new("cn-north-1").with_endpoint(CODECOMMIT, "http://localhost:4566");
        assert_eq!(
            config.endpoint_for(CODECOMMIT).unwrap().as_str(),
            "http://localhost:4566/"
        );
        assert_eq!(
            config.endpoint_for(BEDROCK_AGENT).unwrap().host_str(),
            Some("bedrock-agent.cn-north-1.amazonaws.com.cn")
        );
        assert_eq!(config.partition(), "aws-cn");
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(|key| match key {
            "AWS_DEFAULT_REGION" => Some("eu-west-1".to_string()),
            "CIRRUS_ENDPOINT_BEDROCKAGENT" => Some("http://127.0.0.1:9000".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(
            config.endpoint_for(BEDROCK_AGENT).unwrap().as_str(),
            "http://127.0.0.1:9000/"
        );

        assert!(ClientConfig::from_lookup(|_| None).is_err());
    }

    #[test]
    fn test_apply_lookup_keeps_explicit_values() {
        let mut config = ClientConfig::new("us-east-2").with_endpoint(CODECOMMIT, "http://explicit:1");
        config.apply_lookup(|key| match key {
            "AWS_REGION" => Some("eu-central-1".to_string()),
            "CIRRUS_ENDPOINT_CODECOMMIT" => Some("http://env:2".to_string()),
            _ => None,
        });

        assert_eq!(config.region, "us-east-2");
        assert_eq!(config.endpoints["codecommit"], "http://explicit:1");
    }

    #[test]
    fn test_yaml_defaults() {
        let config: ClientConfig = serde_yaml::from_str("region: us-east-1\nrequest_timeout: 2m\n").unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.credentials, CredentialsSource::Environment);
        assert!(config.user_agent.starts_with("cirrus/"));
    }
}
