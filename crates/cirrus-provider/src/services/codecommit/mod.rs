//! CodeCommit resources

mod find;
mod repository;

pub use find::{RepositoryFinder, find_repository_by_name};
pub use repository::{RepositoryConfig, RepositoryResource, RepositoryState};

use crate::dynamic::DynResource;
use crate::registry::{ResourceRegistration, ServicePackage, TagsSpec};

pub struct CodeCommitPackage;

impl ServicePackage for CodeCommitPackage {
    fn name(&self) -> &'static str {
        "codecommit"
    }

    fn resources(&self) -> Vec<ResourceRegistration> {
        vec![ResourceRegistration {
            type_name: "aws_codecommit_repository",
            name: "Repository",
            tags: Some(TagsSpec {
                identifier_attribute: "arn",
            }),
            factory: |clients| DynResource::new(RepositoryResource::new(clients)),
        }]
    }
}
