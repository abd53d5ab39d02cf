//! Existence and drift checks against the remote side
//!
//! Used by acceptance tests and by refresh-only planning. Handlers never
//! call into this module.

use async_trait::async_trait;
use cirrus_core::{AttributeChange, AttributeMap};
use thiserror::Error;

use crate::error::ProviderError;

/// Looks a remote object up by identifier
#[async_trait]
pub trait Finder: Send + Sync {
    type Output: Send;

    /// Display name used in check failures
    fn resource_name(&self) -> &str;

    /// Fetch the object; `ProviderError::NotFound` when it is absent
    async fn find(&self, id: &str) -> Result<Self::Output, ProviderError>;
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{resource} ({id}) does not exist")]
    NotFound { resource: String, id: String },

    #[error("{resource} ({id}) still exists")]
    StillExists { resource: String, id: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Fail unless the object exists; store it in `holder`
pub async fn exists<F: Finder>(finder: &F, id: &str, holder: &mut Option<F::Output>) -> Result<(), CheckError> {
    match finder.find(id).await {
        Ok(found) => {
            *holder = Some(found);
            Ok(())
        }
        Err(e) if e.is_not_found() => Err(CheckError::NotFound {
            resource: finder.resource_name().to_string(),
            id: id.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Fail while any of `ids` still exists
pub async fn destroyed<F, I, S>(finder: &F, ids: I) -> Result<(), CheckError>
where
    F: Finder,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for id in ids {
        let id = id.as_ref();
        match finder.find(id).await {
            Ok(_) => {
                return Err(CheckError::StillExists {
                    resource: finder.resource_name().to_string(),
                    id: id.to_string(),
                });
            }
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Attribute differences between stored state and a fresh read
pub fn drift(prior: &AttributeMap, refreshed: &AttributeMap) -> Vec<AttributeChange> {
    prior.diff(refreshed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    struct Fixed(BTreeMap<&'static str, &'static str>);

    #[async_trait]
    impl Finder for Fixed {
        type Output = String;

        fn resource_name(&self) -> &str {
            "Widget"
        }

        async fn find(&self, id: &str) -> Result<String, ProviderError> {
            self.0
                .get(id)
                .map(|v| v.to_string())
                .ok_or_else(|| ProviderError::not_found("Widget", id))
        }
    }

    #[tokio::test]
    async fn test_exists_fills_holder() {
        let finder = Fixed(BTreeMap::from([("a", "alpha")]));
        let mut holder = None;

        exists(&finder, "a", &mut holder).await.unwrap();
        assert_eq!(holder.as_deref(), Some("alpha"));

        let err = exists(&finder, "b", &mut holder).await.unwrap_err();
        assert_eq!(err.to_string(), "Widget (b) does not exist");
    }

    #[tokio::test]
    async fn test_destroyed() {
        let finder = Fixed(BTreeMap::from([("a", "alpha")]));

        destroyed(&finder, ["b", "c"]).await.unwrap();
        let err = destroyed(&finder, ["b", "a"]).await.unwrap_err();
        assert!(matches!(err, CheckError::StillExists { id, .. } if id == "a"));
    }

    #[test]
    fn test_drift() {
        let prior = AttributeMap::from_json(&json!({ "description": "one", "name": "x" }));
        let refreshed = AttributeMap::from_json(&json!({ "description": "two", "name": "x" }));

        let changes = drift(&prior, &refreshed);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "description");
    }
}
