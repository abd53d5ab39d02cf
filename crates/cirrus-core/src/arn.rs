//! Amazon Resource Names

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

static ARN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^arn:(?P<partition>[^:]+):(?P<service>[^:]+):(?P<region>[^:]*):(?P<account>[^:]*):(?P<resource>.+)$")
        .expect("valid ARN regex")
});

/// A parsed ARN, e.g. `arn:aws:iam::123456789012:role/kb-role`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    pub fn new(
        partition: impl Into<String>,
        service: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            partition: partition.into(),
            service: service.into(),
            region: region.into(),
            account_id: account_id.into(),
            resource: resource.into(),
        }
    }

    pub fn is_valid(s: &str) -> bool {
        ARN_REGEX.is_match(s)
    }
}

impl FromStr for Arn {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = ARN_REGEX.captures(s).ok_or_else(|| CoreError::InvalidArn {
            arn: s.to_string(),
            message: "expected arn:partition:service:region:account:resource".to_string(),
        })?;

        Ok(Self::new(
            &captures["partition"],
            &captures["service"],
            &captures["region"],
            &captures["account"],
            &captures["resource"],
        ))
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}
