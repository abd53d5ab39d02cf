//! Cirrus Provider - resource handlers and their lifecycle
//!
//! This crate provides:
//! - **Resource handlers**: `aws_codecommit_repository` and `aws_bedrockagent_knowledge_base`
//! - **Registry**: service packages and the type-erased [`DynResource`] wrappers
//! - **Update sequencing**: multi-call updates that report what was applied on failure
//! - **Waiters**: status polling for asynchronous operations
//! - **Tags**: provider default tags, ignore rules and tag reconciliation
//! - **State storage**: JSON file and in-memory state stores
//! - **Workspace**: plan, apply, import, refresh and destroy over a configuration file
//! - **Acceptance harness**: configuration steps against in-memory services

pub mod acctest;
pub mod check;
pub mod config;
pub mod conns;
pub mod dynamic;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod resource;
pub mod sequencer;
pub mod services;
pub mod storage;
pub mod tags;
pub mod waiter;
pub mod workspace;

pub use check::{CheckError, Finder};
pub use config::{Configuration, ResourceBlock};
pub use conns::{Clients, ProviderConfig, TagsContext, WaitSettings};
pub use dynamic::DynResource;
pub use error::{ErrAction, ProviderError, Result};
pub use lifecycle::Lifecycle;
pub use registry::{Provider, ResourceRegistration, ServicePackage, TagsSpec, service_packages};
pub use resource::{ResourceHandler, ResourceState};
pub use sequencer::UpdateSequencer;
pub use storage::{
    DEFAULT_STATE_FILE, FileStateStore, MemoryStateStore, OperationCounts, StateStore,
    StoredInstance,
};
pub use waiter::StateChangeConf;
pub use workspace::{Drift, DriftReport, Plan, PlanCounts, PlannedChange, Workspace};
