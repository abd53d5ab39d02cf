use async_trait::async_trait;
use cirrus_client::codecommit::{GetRepositoryInput, RepositoryMetadata, error_codes};
use cirrus_client::CodeCommitApi;
use std::sync::Arc;
use tracing::debug;

use super::repository::RESOURCE_NAME;
use crate::check::Finder;
use crate::error::{ErrAction, ProviderError, Result};

/// Look a repository up by name
pub async fn find_repository_by_name(conn: &dyn CodeCommitApi, name: &str) -> Result<RepositoryMetadata> {
    debug!(repository = name, "GetRepository");

    let output = conn
        .get_repository(GetRepositoryInput {
            repository_name: name.to_string(),
        })
        .await
        .map_err(|e| {
            if e.is_code(error_codes::REPOSITORY_DOES_NOT_EXIST) {
                ProviderError::not_found(RESOURCE_NAME, name)
            } else {
                ProviderError::api(ErrAction::Reading, RESOURCE_NAME, name, e)
            }
        })?;

    output
        .repository_metadata
        .ok_or_else(|| ProviderError::not_found(RESOURCE_NAME, name))
}

/// Repository finder for existence checks
#[derive(Clone)]
pub struct RepositoryFinder {
    conn: Arc<dyn CodeCommitApi>,
}

impl RepositoryFinder {
    pub fn new(conn: Arc<dyn CodeCommitApi>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Finder for RepositoryFinder {
    type Output = RepositoryMetadata;

    fn resource_name(&self) -> &str {
        RESOURCE_NAME
    }

    async fn find(&self, id: &str) -> Result<RepositoryMetadata> {
        find_repository_by_name(self.conn.as_ref(), id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_client::codecommit::CreateRepositoryInput;
    use cirrus_client::{ApiError, MockCodeCommit};

    #[tokio::test]
    async fn test_missing_repository_is_not_found() {
        let mock = MockCodeCommit::new();
        let err = find_repository_by_name(&mock, "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_other_errors_keep_context() {
        let mock = MockCodeCommit::new();
        mock.create_repository(CreateRepositoryInput {
            repository_name: "repo".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        mock.fail_next("GetRepository", ApiError::new("ThrottlingException", "slow down"));

        let err = find_repository_by_name(&mock, "repo").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "reading CodeCommit Repository (repo): ThrottlingException: slow down"
        );

        let finder = RepositoryFinder::new(Arc::new(mock));
        assert_eq!(finder.find("repo").await.unwrap().repository_name.as_deref(), Some("repo"));
    }
}
