//! Ordered multi-call updates
//!
//! Some resources cannot be updated in one request: every changed attribute
//! maps to its own API call. [`UpdateSequencer`] runs those calls in the
//! order the handler lists them and stops at the first failure, reporting
//! which steps were already applied. Applied steps are not rolled back.

use cirrus_client::ClientError;
use cirrus_core::ChangeSet;
use std::future::Future;
use tracing::debug;

use crate::error::{ProviderError, Result};

/// Runs one API call per changed attribute
#[derive(Debug)]
pub struct UpdateSequencer<'a> {
    resource: &'static str,
    id: String,
    changes: &'a ChangeSet,
    applied: Vec<String>,
}

impl<'a> UpdateSequencer<'a> {
    pub fn new(resource: &'static str, id: impl Into<String>, changes: &'a ChangeSet) -> Self {
        Self {
            resource,
            id: id.into(),
            changes,
            applied: Vec::new(),
        }
    }

    /// Current identifier; a rename step moves it
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Attributes whose step already succeeded
    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    /// Run `call` when `attribute` changed
    ///
    /// `call` receives the current identifier. Returns `None` when the
    /// attribute is unchanged and no call was made.
    pub async fn step<T, F, Fut>(&mut self, attribute: &str, label: &str, call: F) -> Result<Option<T>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = std::result::Result<T, ClientError>>,
    {
        self.step_any(&[attribute], label, call).await
    }

    /// Run `call` when any of `attributes` changed
    pub async fn step_any<T, F, Fut>(&mut self, attributes: &[&str], label: &str, call: F) -> Result<Option<T>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = std::result::Result<T, ClientError>>,
    {
        self.run(attributes, label, |id| {
            let pending = call(id);
            async move { pending.await.map(Some) }
        })
        .await
    }

    /// Run `call` when `attribute` changed; `call` returns `None` when it
    /// decided not to reach the service, and the step is not recorded
    pub async fn step_optional<T, F, Fut>(&mut self, attribute: &str, label: &str, call: F) -> Result<Option<T>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = std::result::Result<Option<T>, ClientError>>,
    {
        self.run(&[attribute], label, call).await
    }

    async fn run<T, F, Fut>(&mut self, attributes: &[&str], label: &str, call: F) -> Result<Option<T>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = std::result::Result<Option<T>, ClientError>>,
    {
        if !self.changes.has_changes(attributes) {
            return Ok(None);
        }

        debug!(resource = self.resource, id = %self.id, step = label, "applying update step");

        match call(self.id.clone()).await {
            Ok(Some(value)) => {
                self.applied
                    .extend(attributes.iter().filter(|a| self.changes.has_change(a)).map(|a| a.to_string()));
                Ok(Some(value))
            }
            Ok(None) => {
                debug!(resource = self.resource, id = %self.id, step = label, "update step skipped");
                Ok(None)
            }
            Err(source) => Err(ProviderError::PartialUpdate {
                resource: self.resource.to_string(),
                id: self.id.clone(),
                step: label.to_string(),
                applied: self.applied.clone(),
                source,
            }),
        }
    }

    /// Final identifier after all steps
    pub fn finish(self) -> String {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_core::AttributeChange;

    fn changes(names: &[&str]) -> ChangeSet {
        names
            .iter()
            .map(|name| AttributeChange {
                path: name.to_string(),
                old: Some("old".to_string()),
                new: Some("new".to_string()),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_unchanged_attributes_make_no_call() {
        let changes = changes(&["description"]);
        let mut seq = UpdateSequencer::new("Thing", "id-1", &changes);
        let mut calls = Vec::new();

        let skipped = seq
            .step("name", "name", |_| async { Ok::<_, ClientError>(()) })
            .await
            .unwrap();
        assert!(skipped.is_none());

        seq.step("description", "description", |id| {
            calls.push(id);
            async { Ok::<_, ClientError>(()) }
        })
        .await
        .unwrap();

        assert_eq!(calls, vec!["id-1"]);
        assert_eq!(seq.applied(), ["description"]);
    }

    #[tokio::test]
    async fn test_rename_moves_id_for_later_steps() {
        let changes = changes(&["name", "description"]);
        let mut seq = UpdateSequencer::new("Thing", "old", &changes);

        seq.step("name", "name", |_| async { Ok::<_, ClientError>(()) })
            .await
            .unwrap();
        seq.set_id("new");

        let seen = seq
            .step("description", "description", |id| async move { Ok::<_, ClientError>(id) })
            .await
            .unwrap();
        assert_eq!(seen.as_deref(), Some("new"));
        assert_eq!(seq.finish(), "new");
    }

    #[tokio::test]
    async fn test_failure_reports_applied_steps() {
        let changes = changes(&["name", "default_branch", "description"]);
        let mut seq = UpdateSequencer::new("CodeCommit Repository", "repo", &changes);

        seq.step("name", "name", |_| async { Ok::<_, ClientError>(()) })
            .await
            .unwrap();
        let err = seq
            .step("default_branch", "default branch", |_| async {
                Err::<(), _>(ClientError::api("BranchDoesNotExistException", "missing"))
            })
            .await
            .unwrap_err();

        match err {
            ProviderError::PartialUpdate { step, applied, .. } => {
                assert_eq!(step, "default branch");
                assert_eq!(applied, vec!["name"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_skipped_step_is_not_recorded() {
        let changes = changes(&["default_branch", "description"]);
        let mut seq = UpdateSequencer::new("CodeCommit Repository", "repo", &changes);

        let skipped = seq
            .step_optional("default_branch", "default branch", |_| async {
                Ok::<Option<()>, ClientError>(None)
            })
            .await
            .unwrap();
        assert!(skipped.is_none());
        assert!(seq.applied().is_empty());

        let err = seq
            .step("description", "description", |_| async {
                Err::<(), _>(ClientError::api("InvalidRepositoryDescriptionException", "rejected"))
            })
            .await
            .unwrap_err();
        match err {
            ProviderError::PartialUpdate { applied, .. } => assert!(applied.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
