//! CodeCommit repositories API
//!
//! JSON 1.1 protocol; every operation is `POST /` with
//! `X-Amz-Target: CodeCommit_20150413.<Operation>`.

mod client;
mod mock;
pub mod types;

pub use client::CodeCommitClient;
pub use mock::MockCodeCommit;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;
use crate::tagging::ResourceTagger;

/// Error codes returned by CodeCommit
pub mod error_codes {
    pub const REPOSITORY_DOES_NOT_EXIST: &str = "RepositoryDoesNotExistException";
    pub const REPOSITORY_NAME_EXISTS: &str = "RepositoryNameExistsException";
    pub const REPOSITORY_NAME_REQUIRED: &str = "RepositoryNameRequiredException";
    pub const BRANCH_DOES_NOT_EXIST: &str = "BranchDoesNotExistException";
    pub const ENCRYPTION_KEY_NOT_FOUND: &str = "EncryptionKeyNotFoundException";
    pub const ENCRYPTION_KEY_ACCESS_DENIED: &str = "EncryptionKeyAccessDeniedException";
    pub const INVALID_RESOURCE_ARN: &str = "InvalidResourceArnException";
}

/// CodeCommit operations used by the repository resource
#[async_trait]
pub trait CodeCommitApi: ResourceTagger {
    async fn create_repository(&self, input: CreateRepositoryInput) -> Result<CreateRepositoryOutput>;

    async fn get_repository(&self, input: GetRepositoryInput) -> Result<GetRepositoryOutput>;

    async fn delete_repository(&self, input: DeleteRepositoryInput) -> Result<DeleteRepositoryOutput>;

    async fn update_repository_name(&self, input: UpdateRepositoryNameInput) -> Result<()>;

    async fn update_repository_description(&self, input: UpdateRepositoryDescriptionInput) -> Result<()>;

    async fn update_default_branch(&self, input: UpdateDefaultBranchInput) -> Result<()>;

    async fn update_repository_encryption_key(
        &self,
        input: UpdateRepositoryEncryptionKeyInput,
    ) -> Result<UpdateRepositoryEncryptionKeyOutput>;

    async fn list_branches(&self, input: ListBranchesInput) -> Result<ListBranchesOutput>;
}
