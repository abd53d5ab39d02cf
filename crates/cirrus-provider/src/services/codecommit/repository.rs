//! `aws_codecommit_repository`
//!
//! The repository name is the identifier, so renaming moves the id. Every
//! mutable attribute has its own API call; updates run through the
//! [`UpdateSequencer`] in the order name, default branch, description,
//! encryption key, tags.

use async_trait::async_trait;
use cirrus_client::codecommit::{
    CreateRepositoryInput, DeleteRepositoryInput, ListBranchesInput, UpdateDefaultBranchInput,
    UpdateRepositoryDescriptionInput, UpdateRepositoryEncryptionKeyInput, UpdateRepositoryNameInput,
    error_codes,
};
use cirrus_client::CodeCommitApi;
use cirrus_core::names::{ATTR_ARN, ATTR_DESCRIPTION, ATTR_ID, ATTR_TAGS, ATTR_TAGS_ALL};
use cirrus_core::serde_ext::non_empty;
use cirrus_core::{Arn, Attribute, AttributeMap, ChangeSet, KeyValueTags, Schema, Validator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::find::find_repository_by_name;
use crate::conns::{Clients, TagsContext};
use crate::error::{ErrAction, ProviderError, Result};
use crate::resource::{ResourceHandler, ResourceState};
use crate::sequencer::UpdateSequencer;
use crate::tags::{desired_tags_all, read_tags, update_tags};

pub const RESOURCE_NAME: &str = "CodeCommit Repository";

const ATTR_REPOSITORY_NAME: &str = "repository_name";
const ATTR_DEFAULT_BRANCH: &str = "default_branch";
const ATTR_KMS_KEY_ID: &str = "kms_key_id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub repository_name: String,
    #[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryState {
    pub id: String,
    pub arn: String,
    pub repository_id: String,
    pub repository_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub clone_url_http: String,
    #[serde(default)]
    pub clone_url_ssh: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub tags_all: BTreeMap<String, String>,
}

impl ResourceState for RepositoryState {
    fn id(&self) -> &str {
        &self.id
    }
}

impl RepositoryState {
    /// Values read back with configured fields the service does not echo
    fn seed(id: &str, config: &RepositoryConfig) -> Self {
        Self {
            id: id.to_string(),
            repository_name: id.to_string(),
            default_branch: config.default_branch.clone(),
            tags: config.tags.clone(),
            ..Default::default()
        }
    }
}

pub struct RepositoryResource {
    conn: Arc<dyn CodeCommitApi>,
    tags: TagsContext,
}

impl RepositoryResource {
    pub fn new(clients: &Clients) -> Self {
        Self {
            conn: clients.codecommit.clone(),
            tags: clients.tags.clone(),
        }
    }

    /// Point the default branch at `branch`, skipping empty repositories
    ///
    /// Returns `None` when no `UpdateDefaultBranch` call was made.
    async fn update_default_branch(&self, seq: &mut UpdateSequencer<'_>, branch: Option<&str>) -> Result<Option<()>> {
        let Some(branch) = branch else {
            return Ok(None);
        };
        let conn = &self.conn;

        seq.step_optional(ATTR_DEFAULT_BRANCH, "default branch", |id| async move {
            debug!(repository = %id, "ListBranches");
            let listed = conn
                .list_branches(ListBranchesInput {
                    repository_name: id.clone(),
                    next_token: None,
                })
                .await?;

            if listed.branches.is_empty() {
                warn!(repository = %id, branch, "repository has no branches, not setting default branch");
                return Ok(None);
            }

            debug!(repository = %id, branch, "UpdateDefaultBranch");
            conn.update_default_branch(UpdateDefaultBranchInput {
                repository_name: id,
                default_branch_name: branch.to_string(),
            })
            .await
            .map(Some)
        })
        .await
    }
}

/// ARN of a repository after a rename to `name`
fn renamed_arn(arn: &str, name: &str) -> Result<String> {
    let mut arn: Arn = arn.parse()?;
    arn.resource = name.to_string();
    Ok(arn.to_string())
}

#[async_trait]
impl ResourceHandler for RepositoryResource {
    type Config = RepositoryConfig;
    type State = RepositoryState;

    const TYPE_NAME: &'static str = "aws_codecommit_repository";
    const DISPLAY_NAME: &'static str = RESOURCE_NAME;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute(ATTR_ID, Attribute::computed_string())
            .with_attribute(ATTR_ARN, Attribute::computed_string())
            .with_attribute("repository_id", Attribute::computed_string())
            .with_attribute(
                ATTR_REPOSITORY_NAME,
                Attribute::required_string()
                    .with_validator(Validator::length_between(0, 100))
                    .with_description("Name of the repository"),
            )
            .with_attribute(
                ATTR_DESCRIPTION,
                Attribute::optional_string().with_validator(Validator::length_between(0, 1000)),
            )
            .with_attribute(ATTR_KMS_KEY_ID, Attribute::optional_computed_string())
            .with_attribute(
                ATTR_DEFAULT_BRANCH,
                Attribute::optional_string()
                    .with_description("Only applied once the repository has at least one branch"),
            )
            .with_attribute("clone_url_http", Attribute::computed_string())
            .with_attribute("clone_url_ssh", Attribute::computed_string())
            .with_attribute(ATTR_TAGS, Attribute::tags())
            .with_attribute(ATTR_TAGS_ALL, Attribute::tags_all())
    }

    async fn create(&self, config: &RepositoryConfig) -> Result<RepositoryState> {
        let name = config.repository_name.clone();
        let input = CreateRepositoryInput {
            repository_name: name.clone(),
            repository_description: config.description.clone().unwrap_or_default(),
            tags: desired_tags_all(&self.tags, &config.tags).into_map(),
            kms_key_id: config.kms_key_id.clone(),
        };

        debug!(repository = %name, "CreateRepository");
        self.conn
            .create_repository(input)
            .await
            .map_err(|e| ProviderError::api(ErrAction::Creating, RESOURCE_NAME, &name, e))?;
        info!(repository = %name, "created CodeCommit repository");

        if config.default_branch.is_some() {
            let changes = ChangeSet::additions(&AttributeMap::from_serializable(config)?);
            let mut seq = UpdateSequencer::new(RESOURCE_NAME, name.as_str(), &changes);
            self.update_default_branch(&mut seq, config.default_branch.as_deref())
                .await?;
        }

        let seed = RepositoryState::seed(&name, config);
        self.read(&name, Some(&seed)).await.map_err(|e| match e {
            ProviderError::NotFound { resource, id } => ProviderError::NewResourceNotFound { resource, id },
            other => other,
        })
    }

    async fn read(&self, id: &str, prior: Option<&RepositoryState>) -> Result<RepositoryState> {
        let metadata = find_repository_by_name(self.conn.as_ref(), id).await?;
        let arn = metadata.arn.clone().unwrap_or_default();

        let configured = prior.map(|p| p.tags.clone()).unwrap_or_default();
        debug!(repository = id, "ListTagsForResource");
        let (tags, tags_all) = read_tags(self.conn.as_ref(), &self.tags, &arn, &configured)
            .await
            .map_err(|e| ProviderError::api(ErrAction::ListingTags, RESOURCE_NAME, id, e))?;

        // A default branch only exists once the repository has code; until
        // then the configured value is kept
        let default_branch = match prior {
            Some(p) => p
                .default_branch
                .clone()
                .map(|configured| metadata.default_branch.clone().unwrap_or(configured)),
            None => metadata.default_branch.clone(),
        };

        let name = metadata.repository_name.unwrap_or_else(|| id.to_string());
        Ok(RepositoryState {
            id: name.clone(),
            arn,
            repository_id: metadata.repository_id.unwrap_or_default(),
            repository_name: name,
            description: metadata.repository_description.filter(|d| !d.is_empty()),
            kms_key_id: metadata.kms_key_id,
            default_branch,
            clone_url_http: metadata.clone_url_http.unwrap_or_default(),
            clone_url_ssh: metadata.clone_url_ssh.unwrap_or_default(),
            tags,
            tags_all,
        })
    }

    async fn update(
        &self,
        prior: &RepositoryState,
        config: &RepositoryConfig,
        changes: &ChangeSet,
    ) -> Result<RepositoryState> {
        let conn = &self.conn;
        let mut seq = UpdateSequencer::new(RESOURCE_NAME, prior.id.as_str(), changes);

        let new_name = config.repository_name.clone();
        let renamed = seq
            .step(ATTR_REPOSITORY_NAME, "name", |id| async move {
                debug!(repository = %id, new_name = %new_name, "UpdateRepositoryName");
                conn.update_repository_name(UpdateRepositoryNameInput {
                    old_name: id,
                    new_name,
                })
                .await
            })
            .await?;
        if renamed.is_some() {
            seq.set_id(config.repository_name.as_str());
        }

        self.update_default_branch(&mut seq, config.default_branch.as_deref())
            .await?;

        let description = config.description.clone().unwrap_or_default();
        seq.step(ATTR_DESCRIPTION, "description", |id| async move {
            debug!(repository = %id, "UpdateRepositoryDescription");
            conn.update_repository_description(UpdateRepositoryDescriptionInput {
                repository_name: id,
                repository_description: Some(description),
            })
            .await
        })
        .await?;

        if let Some(kms_key_id) = config.kms_key_id.clone() {
            seq.step(ATTR_KMS_KEY_ID, "encryption key", |id| async move {
                debug!(repository = %id, "UpdateRepositoryEncryptionKey");
                conn.update_repository_encryption_key(UpdateRepositoryEncryptionKeyInput {
                    repository_name: id,
                    kms_key_id,
                })
                .await
            })
            .await?;
        }

        let arn = renamed_arn(&prior.arn, seq.id())?;
        let old_tags = KeyValueTags::from(prior.tags_all.clone());
        let new_tags = desired_tags_all(&self.tags, &config.tags);
        seq.step_any(&[ATTR_TAGS, ATTR_TAGS_ALL], "tags", |_| async move {
            update_tags(conn.as_ref(), &arn, &old_tags, &new_tags).await
        })
        .await?;

        let id = seq.finish();
        let seed = RepositoryState::seed(&id, config);
        self.read(&id, Some(&seed)).await
    }

    fn moved(&self, prior: &RepositoryState, id: &str) -> Result<Option<RepositoryState>> {
        Ok(Some(RepositoryState {
            id: id.to_string(),
            arn: renamed_arn(&prior.arn, id)?,
            repository_name: id.to_string(),
            ..prior.clone()
        }))
    }

    async fn delete(&self, state: &RepositoryState) -> Result<()> {
        debug!(repository = %state.id, "DeleteRepository");
        let deleted = self
            .conn
            .delete_repository(DeleteRepositoryInput {
                repository_name: state.id.clone(),
            })
            .await;
        match deleted {
            Ok(_) => {}
            Err(e) if e.is_code(error_codes::REPOSITORY_DOES_NOT_EXIST) => return Ok(()),
            Err(e) => return Err(ProviderError::api(ErrAction::Deleting, RESOURCE_NAME, &state.id, e)),
        }
        info!(repository = %state.id, "deleted CodeCommit repository");
        Ok(())
    }
}
