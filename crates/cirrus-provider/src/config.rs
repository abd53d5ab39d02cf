//! Workspace configuration files
//!
//! ```yaml
//! provider:
//!   region: us-west-2
//!   default_tags:
//!     team: platform
//!
//! resources:
//!   - type: aws_codecommit_repository
//!     name: main
//!     config:
//!       repository_name: my-repo
//!       description: Application sources
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::path::Path;

use crate::conns::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::storage::address;

/// One declared resource instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceBlock {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Raw configuration, validated against the type's schema at plan time
    #[serde(default = "empty_object")]
    pub config: JsonValue,
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

impl ResourceBlock {
    pub fn address(&self) -> String {
        address(&self.resource_type, &self.name)
    }
}

/// A parsed workspace file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub resources: Vec<ResourceBlock>,
}

impl Configuration {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Configuration = serde_yaml::from_str(content)
            .map_err(|e| ProviderError::Config(format!("cannot parse workspace file: {}", e)))?;
        config.check_addresses()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn resource(&self, address: &str) -> Option<&ResourceBlock> {
        self.resources.iter().find(|r| r.address() == address)
    }

    fn check_addresses(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for block in &self.resources {
            if block.name.is_empty() || block.name.contains('.') {
                return Err(ProviderError::Config(format!(
                    "invalid resource name '{}' for type {}",
                    block.name, block.resource_type
                )));
            }
            if !seen.insert(block.address()) {
                return Err(ProviderError::Config(format!(
                    "duplicate resource {}",
                    block.address()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workspace() {
        let config = Configuration::from_yaml(
            r#"
provider:
  region: eu-central-1
  default_tags:
    team: platform
resources:
  - type: aws_codecommit_repository
    name: main
    config:
      repository_name: my-repo
  - type: aws_codecommit_repository
    name: mirror
"#,
        )
        .unwrap();

        assert_eq!(config.provider.client.region, "eu-central-1");
        assert_eq!(config.resources.len(), 2);
        let main = config.resource("aws_codecommit_repository.main").unwrap();
        assert_eq!(main.config["repository_name"], "my-repo");
        assert!(config.resources[1].config.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_empty_file_is_empty_workspace() {
        let config = Configuration::from_yaml("{}").unwrap();
        assert!(config.resources.is_empty());
        assert!(config.provider.default_tags.is_empty());
    }

    #[test]
    fn test_rejects_duplicates_and_bad_names() {
        let dup = Configuration::from_yaml(
            r#"
resources:
  - { type: aws_codecommit_repository, name: a }
  - { type: aws_codecommit_repository, name: a }
"#,
        )
        .unwrap_err();
        assert!(dup.to_string().contains("duplicate resource aws_codecommit_repository.a"));

        let dotted = Configuration::from_yaml(
            "resources:\n  - { type: aws_codecommit_repository, name: a.b }\n",
        )
        .unwrap_err();
        assert!(matches!(dotted, ProviderError::Config(_)));
    }
}
