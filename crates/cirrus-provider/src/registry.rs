//! Resource type registry
//!
//! Each service package lists the resource types it provides. [`Provider`]
//! instantiates every registered type against one set of [`Clients`].

use std::collections::BTreeMap;

use crate::conns::Clients;
use crate::dynamic::DynResource;
use crate::error::{ProviderError, Result};
use crate::services::{BedrockAgentPackage, CodeCommitPackage};

/// Tag support of a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagsSpec {
    /// State attribute holding the identifier passed to tagging calls
    pub identifier_attribute: &'static str,
}

/// One resource type offered by a service package
#[derive(Debug, Clone, Copy)]
pub struct ResourceRegistration {
    pub type_name: &'static str,
    /// Short name within the service, e.g. `Repository`
    pub name: &'static str,
    pub tags: Option<TagsSpec>,
    pub factory: fn(&Clients) -> Result<DynResource>,
}

/// A service and the resources it provides
pub trait ServicePackage: Send + Sync {
    fn name(&self) -> &'static str;

    fn resources(&self) -> Vec<ResourceRegistration>;
}

/// Packages compiled into this provider
pub fn service_packages() -> Vec<Box<dyn ServicePackage>> {
    vec![Box::new(BedrockAgentPackage), Box::new(CodeCommitPackage)]
}

/// All resource types, ready to use
#[derive(Debug, Clone)]
pub struct Provider {
    clients: Clients,
    resources: BTreeMap<&'static str, DynResource>,
    registrations: Vec<(&'static str, ResourceRegistration)>,
}

impl Provider {
    pub fn new(clients: Clients) -> Result<Self> {
        let mut resources = BTreeMap::new();
        let mut registrations = Vec::new();

        for package in service_packages() {
            for registration in package.resources() {
                let mut resource = (registration.factory)(&clients)?;
                if registration.tags.is_some() {
                    resource = resource.with_tags(clients.tags.clone());
                }
                resources.insert(registration.type_name, resource);
                registrations.push((package.name(), registration));
            }
        }
        registrations.sort_by_key(|(_, r)| r.type_name);

        Ok(Self {
            clients,
            resources,
            registrations,
        })
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn resource(&self, type_name: &str) -> Result<&DynResource> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()))
    }

    /// `(service, registration)` pairs sorted by type name
    pub fn registrations(&self) -> &[(&'static str, ResourceRegistration)] {
        &self.registrations
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_client::{MockBedrockAgent, MockCodeCommit};

    fn provider() -> Provider {
        Provider::new(Clients::in_memory(MockCodeCommit::new(), MockBedrockAgent::new())).unwrap()
    }

    #[test]
    fn test_registers_both_services() {
        let provider = provider();
        assert_eq!(
            provider.type_names().collect::<Vec<_>>(),
            vec!["aws_bedrockagent_knowledge_base", "aws_codecommit_repository"]
        );

        let (service, registration) = &provider.registrations()[1];
        assert_eq!(*service, "codecommit");
        assert_eq!(registration.name, "Repository");
        assert_eq!(registration.tags.map(|t| t.identifier_attribute), Some("arn"));
        assert!(provider.resource("aws_codecommit_repository").unwrap().is_taggable());
    }

    #[test]
    fn test_unknown_type() {
        let err = provider().resource("aws_s3_bucket").unwrap_err();
        assert!(err.to_string().starts_with("unknown resource type 'aws_s3_bucket'"));
    }
}
