//! Service connections shared by every resource handler
//!
//! [`Clients`] is built once per provider and handed to each handler, which
//! keeps only the `Arc` handles it needs.

use cirrus_client::{
    BedrockAgentApi, BedrockAgentClient, ClientConfig, CodeCommitApi, CodeCommitClient,
    MockBedrockAgent, MockCodeCommit,
};
use cirrus_core::{IgnoreConfig, KeyValueTags};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Provider block of a workspace file
///
/// ```yaml
/// provider:
///   region: us-west-2
///   default_tags:
///     team: platform
///   ignore_tags:
///     key_prefixes: ["kubernetes.io/"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub client: ClientConfig,

    /// Tags applied to every taggable resource
    #[serde(default, skip_serializing_if = "KeyValueTags::is_empty")]
    pub default_tags: KeyValueTags,

    /// Tags the provider never reads back nor modifies
    #[serde(default)]
    pub ignore_tags: IgnoreConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::new(String::new()),
            default_tags: KeyValueTags::new(),
            ignore_tags: IgnoreConfig::default(),
        }
    }
}

impl ProviderConfig {
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            ..Self::default()
        }
    }

    /// Fill unset region and endpoints from the process environment
    pub fn with_env(mut self) -> Self {
        self.client.apply_lookup(|key| std::env::var(key).ok());
        self
    }
}

/// Tag settings applied by every taggable resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagsContext {
    pub default_tags: KeyValueTags,
    pub ignore: IgnoreConfig,
}

/// Polling cadence of status waiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    /// Pause before the first poll
    pub delay: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl WaitSettings {
    /// Poll without pauses, for in-memory services
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
        }
    }
}

/// Connections and provider-wide settings
#[derive(Clone)]
pub struct Clients {
    pub codecommit: Arc<dyn CodeCommitApi>,
    pub bedrock_agent: Arc<dyn BedrockAgentApi>,
    pub region: String,
    pub partition: String,
    pub tags: TagsContext,
    pub wait: WaitSettings,
}

impl std::fmt::Debug for Clients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clients")
            .field("region", &self.region)
            .field("partition", &self.partition)
            .field("tags", &self.tags)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl Clients {
    /// Connect to the real services
    pub fn connect(config: &ProviderConfig) -> Result<Self> {
        let codecommit = CodeCommitClient::new(&config.client)?;
        let bedrock_agent = BedrockAgentClient::new(&config.client)?;

        Ok(Self {
            codecommit: Arc::new(codecommit),
            bedrock_agent: Arc::new(bedrock_agent),
            region: config.client.region.clone(),
            partition: config.client.partition().to_string(),
            tags: TagsContext {
                default_tags: config.default_tags.clone(),
                ignore: config.ignore_tags.clone(),
            },
            wait: WaitSettings::default(),
        })
    }

    /// Use in-memory services
    pub fn in_memory(codecommit: MockCodeCommit, bedrock_agent: MockBedrockAgent) -> Self {
        Self {
            codecommit: Arc::new(codecommit),
            bedrock_agent: Arc::new(bedrock_agent),
            region: "us-west-2".to_string(),
            partition: "aws".to_string(),
            tags: TagsContext::default(),
            wait: WaitSettings::immediate(),
        }
    }

    pub fn with_default_tags(mut self, tags: KeyValueTags) -> Self {
        self.tags.default_tags = tags;
        self
    }

    pub fn with_ignore_tags(mut self, ignore: IgnoreConfig) -> Self {
        self.tags.ignore = ignore;
        self
    }

    pub fn with_wait(mut self, wait: WaitSettings) -> Self {
        self.wait = wait;
        self
    }
}
