//! Service packages

pub mod bedrockagent;
pub mod codecommit;

pub use bedrockagent::BedrockAgentPackage;
pub use codecommit::CodeCommitPackage;
