//! In-memory CodeCommit for tests
//!
//! Behaves like the real service for the operations the repository resource
//! uses, records every call in order, and supports one-shot fault injection
//! and out-of-band changes (deletion, drift, pushing branches).

use async_trait::async_trait;
use cirrus_core::Arn;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::error_codes::*;
use super::types::*;
use super::CodeCommitApi;
use crate::error::{ApiError, ClientError, Result};
use crate::tagging::ResourceTagger;

#[derive(Debug, Clone)]
struct MockRepository {
    metadata: RepositoryMetadata,
    branches: Vec<String>,
    tags: BTreeMap<String, String>,
}

#[derive(Debug)]
struct MockState {
    region: String,
    account_id: String,
    repositories: BTreeMap<String, MockRepository>,
    calls: Vec<String>,
    failures: BTreeMap<String, ApiError>,
}

/// In-memory CodeCommit
#[derive(Debug, Clone)]
pub struct MockCodeCommit {
    state: Arc<RwLock<MockState>>,
}

impl Default for MockCodeCommit {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCodeCommit {
    pub fn new() -> Self {
        Self::with_account("us-west-2", "123456789012")
    }

    pub fn with_account(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState {
                region: region.into(),
                account_id: account_id.into(),
                repositories: BTreeMap::new(),
                calls: Vec::new(),
                failures: BTreeMap::new(),
            })),
        }
    }

    /// Operations invoked so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.read().unwrap().calls.clone()
    }

    /// Number of times `operation` was invoked
    pub fn call_count(&self, operation: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.as_str() == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.write().unwrap().calls.clear();
    }

    /// Fail the next invocation of `operation` with `error`
    pub fn fail_next(&self, operation: &str, error: ApiError) {
        self.state
            .write()
            .unwrap()
            .failures
            .insert(operation.to_string(), error);
    }

    pub fn repository(&self, name: &str) -> Option<RepositoryMetadata> {
        self.state
            .read()
            .unwrap()
            .repositories
            .get(name)
            .map(|r| r.metadata.clone())
    }

    pub fn repository_tags(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.state
            .read()
            .unwrap()
            .repositories
            .get(name)
            .map(|r| r.tags.clone())
    }

    /// Simulate a push; the first branch becomes the default branch
    pub fn push_branch(&self, repository: &str, branch: &str) {
        let mut state = self.state.write().unwrap();
        if let Some(repo) = state.repositories.get_mut(repository) {
            if !repo.branches.iter().any(|b| b == branch) {
                repo.branches.push(branch.to_string());
            }
            if repo.metadata.default_branch.is_none() {
                repo.metadata.default_branch = Some(branch.to_string());
            }
        }
    }

    /// Delete a repository behind the provider's back
    pub fn delete_out_of_band(&self, name: &str) -> bool {
        self.state.write().unwrap().repositories.remove(name).is_some()
    }

    /// Change a repository description behind the provider's back
    pub fn set_description_out_of_band(&self, name: &str, description: Option<&str>) {
        let mut state = self.state.write().unwrap();
        if let Some(repo) = state.repositories.get_mut(name) {
            repo.metadata.repository_description = description.map(str::to_string);
        }
    }

    /// Set a tag behind the provider's back
    pub fn tag_out_of_band(&self, name: &str, key: &str, value: &str) {
        let mut state = self.state.write().unwrap();
        if let Some(repo) = state.repositories.get_mut(name) {
            repo.tags.insert(key.to_string(), value.to_string());
        }
    }

    fn record(&self, operation: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.push(operation.to_string());
        match state.failures.remove(operation) {
            Some(error) => Err(ClientError::Api(error)),
            None => Ok(()),
        }
    }
}

impl MockState {
    fn repository_mut(&mut self, name: &str) -> Result<&mut MockRepository> {
        self.repositories
            .get_mut(name)
            .ok_or_else(|| does_not_exist(name))
    }

    fn repository_by_arn_mut(&mut self, arn: &str) -> Result<&mut MockRepository> {
        self.repositories
            .values_mut()
            .find(|r| r.metadata.arn.as_deref() == Some(arn))
            .ok_or_else(|| {
                ClientError::api(
                    INVALID_RESOURCE_ARN,
                    format!("The value for the resource ARN is not valid: {}", arn),
                )
            })
    }

    fn set_identity(&self, metadata: &mut RepositoryMetadata, name: &str) {
        let arn = Arn::new("aws", "codecommit", &self.region, &self.account_id, name);
        let host = format!("git-codecommit.{}.amazonaws.com", self.region);
        metadata.repository_name = Some(name.to_string());
        metadata.arn = Some(arn.to_string());
        metadata.clone_url_http = Some(format!("https://{}/v1/repos/{}", host, name));
        metadata.clone_url_ssh = Some(format!("ssh://{}/v1/repos/{}", host, name));
    }
}

fn does_not_exist(name: &str) -> ClientError {
    ClientError::api(REPOSITORY_DOES_NOT_EXIST, format!("{} does not exist", name))
}

fn now() -> f64 {
    chrono::Utc::now().timestamp() as f64
}

fn random_uuid() -> String {
    let mut rng = rand::rng();
    let hex: String = (0..32)
        .map(|_| char::from_digit(rng.random_range(0..16u32), 16).unwrap_or('0'))
        .collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[async_trait]
impl CodeCommitApi for MockCodeCommit {
    async fn create_repository(&self, input: CreateRepositoryInput) -> Result<CreateRepositoryOutput> {
        self.record("CreateRepository")?;
        let mut state = self.state.write().unwrap();

        if input.repository_name.is_empty() {
            return Err(ClientError::api(
                REPOSITORY_NAME_REQUIRED,
                "A repository name is required, but was not specified.",
            ));
        }
        if state.repositories.contains_key(&input.repository_name) {
            return Err(ClientError::api(
                REPOSITORY_NAME_EXISTS,
                format!("Repository named {} already exists", input.repository_name),
            ));
        }

        let mut metadata = RepositoryMetadata {
            account_id: Some(state.account_id.clone()),
            repository_id: Some(random_uuid()),
            repository_description: Some(input.repository_description).filter(|d| !d.is_empty()),
            creation_date: Some(now()),
            last_modified_date: Some(now()),
            kms_key_id: Some(
                input
                    .kms_key_id
                    .unwrap_or_else(|| "alias/aws/codecommit".to_string()),
            ),
            ..Default::default()
        };
        state.set_identity(&mut metadata, &input.repository_name);

        state.repositories.insert(
            input.repository_name,
            MockRepository {
                metadata: metadata.clone(),
                branches: Vec::new(),
                tags: input.tags,
            },
        );

        Ok(CreateRepositoryOutput {
            repository_metadata: Some(metadata),
        })
    }

    async fn get_repository(&self, input: GetRepositoryInput) -> Result<GetRepositoryOutput> {
        self.record("GetRepository")?;
        let mut state = self.state.write().unwrap();
        let repo = state.repository_mut(&input.repository_name)?;
        Ok(GetRepositoryOutput {
            repository_metadata: Some(repo.metadata.clone()),
        })
    }

    async fn delete_repository(&self, input: DeleteRepositoryInput) -> Result<DeleteRepositoryOutput> {
        self.record("DeleteRepository")?;
        let mut state = self.state.write().unwrap();
        let removed = state.repositories.remove(&input.repository_name);
        Ok(DeleteRepositoryOutput {
            repository_id: removed.and_then(|r| r.metadata.repository_id),
        })
    }

    async fn update_repository_name(&self, input: UpdateRepositoryNameInput) -> Result<()> {
        self.record("UpdateRepositoryName")?;
        let mut state = self.state.write().unwrap();

        if state.repositories.contains_key(&input.new_name) {
            return Err(ClientError::api(
                REPOSITORY_NAME_EXISTS,
                format!("Repository named {} already exists", input.new_name),
            ));
        }
        let mut repo = state
            .repositories
            .remove(&input.old_name)
            .ok_or_else(|| does_not_exist(&input.old_name))?;

        state.set_identity(&mut repo.metadata, &input.new_name);
        repo.metadata.last_modified_date = Some(now());
        state.repositories.insert(input.new_name, repo);
        Ok(())
    }

    async fn update_repository_description(&self, input: UpdateRepositoryDescriptionInput) -> Result<()> {
        self.record("UpdateRepositoryDescription")?;
        let mut state = self.state.write().unwrap();
        let repo = state.repository_mut(&input.repository_name)?;
        repo.metadata.repository_description = input.repository_description.filter(|d| !d.is_empty());
        repo.metadata.last_modified_date = Some(now());
        Ok(())
    }

    async fn update_default_branch(&self, input: UpdateDefaultBranchInput) -> Result<()> {
        self.record("UpdateDefaultBranch")?;
        let mut state = self.state.write().unwrap();
        let repo = state.repository_mut(&input.repository_name)?;

        if !repo.branches.contains(&input.default_branch_name) {
            return Err(ClientError::api(
                BRANCH_DOES_NOT_EXIST,
                format!("Branch {} does not exist", input.default_branch_name),
            ));
        }
        repo.metadata.default_branch = Some(input.default_branch_name);
        Ok(())
    }

    async fn update_repository_encryption_key(
        &self,
        input: UpdateRepositoryEncryptionKeyInput,
    ) -> Result<UpdateRepositoryEncryptionKeyOutput> {
        self.record("UpdateRepositoryEncryptionKey")?;
        let mut state = self.state.write().unwrap();
        let repo = state.repository_mut(&input.repository_name)?;

        if input.kms_key_id.is_empty() {
            return Err(ClientError::api(
                ENCRYPTION_KEY_NOT_FOUND,
                "No encryption key was found.",
            ));
        }
        let original = repo.metadata.kms_key_id.replace(input.kms_key_id.clone());
        Ok(UpdateRepositoryEncryptionKeyOutput {
            repository_id: repo.metadata.repository_id.clone(),
            kms_key_id: Some(input.kms_key_id),
            original_kms_key_id: original,
        })
    }

    async fn list_branches(&self, input: ListBranchesInput) -> Result<ListBranchesOutput> {
        self.record("ListBranches")?;
        let mut state = self.state.write().unwrap();
        let repo = state.repository_mut(&input.repository_name)?;
        Ok(ListBranchesOutput {
            branches: repo.branches.clone(),
            next_token: None,
        })
    }
}

#[async_trait]
impl ResourceTagger for MockCodeCommit {
    async fn list_tags(&self, resource_arn: &str) -> Result<BTreeMap<String, String>> {
        self.record("ListTagsForResource")?;
        let mut state = self.state.write().unwrap();
        Ok(state.repository_by_arn_mut(resource_arn)?.tags.clone())
    }

    async fn tag_resource(&self, resource_arn: &str, tags: BTreeMap<String, String>) -> Result<()> {
        self.record("TagResource")?;
        let mut state = self.state.write().unwrap();
        state.repository_by_arn_mut(resource_arn)?.tags.extend(tags);
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<()> {
        self.record("UntagResource")?;
        let mut state = self.state.write().unwrap();
        let repo = state.repository_by_arn_mut(resource_arn)?;
        for key in tag_keys {
            repo.tags.remove(&key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input(name: &str) -> CreateRepositoryInput {
        CreateRepositoryInput {
            repository_name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let mock = MockCodeCommit::new();
        let created = mock.create_repository(create_input("repo")).await.unwrap();
        let metadata = created.repository_metadata.unwrap();

        assert_eq!(
            metadata.arn.as_deref(),
            Some("arn:aws:codecommit:us-west-2:123456789012:repo")
        );
        assert_eq!(metadata.repository_description, None);

        let again = mock.create_repository(create_input("repo")).await.unwrap_err();
        assert!(again.is_code(REPOSITORY_NAME_EXISTS));

        mock.delete_repository(DeleteRepositoryInput {
            repository_name: "repo".into(),
        })
        .await
        .unwrap();

        let err = mock
            .get_repository(GetRepositoryInput {
                repository_name: "repo".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_code(REPOSITORY_DOES_NOT_EXIST));
        assert_eq!(
            mock.calls(),
            vec!["CreateRepository", "CreateRepository", "DeleteRepository", "GetRepository"]
        );
    }

    #[tokio::test]
    async fn test_rename_moves_identity_and_tags() {
        let mock = MockCodeCommit::new();
        let mut input = create_input("old");
        input.tags.insert("k1".into(), "v1".into());
        mock.create_repository(input).await.unwrap();

        mock.update_repository_name(UpdateRepositoryNameInput {
            old_name: "old".into(),
            new_name: "new".into(),
        })
        .await
        .unwrap();

        assert!(mock.repository("old").is_none());
        let renamed = mock.repository("new").unwrap();
        assert!(renamed.arn.unwrap().ends_with(":new"));
        assert!(renamed.clone_url_http.unwrap().ends_with("/v1/repos/new"));
        assert_eq!(mock.repository_tags("new").unwrap()["k1"], "v1");
    }

    #[tokio::test]
    async fn test_default_branch_requires_existing_branch() {
        let mock = MockCodeCommit::new();
        mock.create_repository(create_input("repo")).await.unwrap();

        let update = || UpdateDefaultBranchInput {
            repository_name: "repo".into(),
            default_branch_name: "dev".into(),
        };
        let err = mock.update_default_branch(update()).await.unwrap_err();
        assert!(err.is_code(BRANCH_DOES_NOT_EXIST));

        mock.push_branch("repo", "main");
        mock.push_branch("repo", "dev");
        assert_eq!(mock.repository("repo").unwrap().default_branch.as_deref(), Some("main"));

        mock.update_default_branch(update()).await.unwrap();
        assert_eq!(mock.repository("repo").unwrap().default_branch.as_deref(), Some("dev"));
    }

    #[tokio::test]
    async fn test_fault_injection_is_one_shot() {
        let mock = MockCodeCommit::new();
        mock.fail_next("CreateRepository", ApiError::new("ThrottlingException", "slow down"));

        let err = mock.create_repository(create_input("repo")).await.unwrap_err();
        assert!(err.is_code("ThrottlingException"));
        assert!(mock.create_repository(create_input("repo")).await.is_ok());
        assert_eq!(mock.call_count("CreateRepository"), 2);
    }
}
