//! Per-operation timeouts configured on a resource

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts for the long-running operations of a resource
///
/// ```yaml
/// timeouts:
///   create: 45m
///   delete: 10m
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub create: Option<Duration>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub update: Option<Duration>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub delete: Option<Duration>,
}

impl Timeouts {
    pub fn create_or(&self, default: Duration) -> Duration {
        self.create.unwrap_or(default)
    }

    pub fn update_or(&self, default: Duration) -> Duration {
        self.update.unwrap_or(default)
    }

    pub fn delete_or(&self, default: Duration) -> Duration {
        self.delete.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_humantime() {
        let timeouts: Timeouts = serde_yaml::from_str("create: 45m\ndelete: 1h 30m\n").unwrap();

        assert_eq!(timeouts.create, Some(Duration::from_secs(45 * 60)));
        assert_eq!(timeouts.update, None);
        assert_eq!(timeouts.delete_or(Duration::ZERO), Duration::from_secs(90 * 60));
        assert_eq!(timeouts.update_or(Duration::from_secs(1800)), Duration::from_secs(1800));
    }

    #[test]
    fn test_unset_fields_are_not_serialized() {
        let timeouts = Timeouts {
            create: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&timeouts).unwrap(), r#"{"create":"1m"}"#);
    }
}
