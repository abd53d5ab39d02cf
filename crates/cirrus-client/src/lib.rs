//! Cirrus Service Clients
//!
//! Thin, signed clients for the two remote APIs the provider manages:
//!
//! - **CodeCommit**: JSON 1.1 RPC (`X-Amz-Target` dispatch)
//! - **Bedrock Agent**: REST-JSON knowledge base endpoints
//!
//! ## Key Features
//!
//! - **One trait per service**: [`CodeCommitApi`] and [`BedrockAgentApi`],
//!   both extending [`ResourceTagger`], so resources never see HTTP
//! - **SigV4 signing**: static, environment, or shared-profile credentials
//! - **In-memory fakes**: [`MockCodeCommit`] and [`MockBedrockAgent`] model
//!   the services closely enough for acceptance tests
//! - **No retries**: each call makes exactly one request
//!
//! ## Example
//!
//! ```rust,no_run
//! use cirrus_client::{ClientConfig, CodeCommitApi, CodeCommitClient, GetRepositoryInput};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("us-west-2");
//! let client = CodeCommitClient::new(&config)?;
//!
//! let output = client
//!     .get_repository(GetRepositoryInput {
//!         repository_name: "my-repo".to_string(),
//!     })
//!     .await?;
//! println!("{:?}", output.repository_metadata.and_then(|m| m.arn));
//! # Ok(())
//! # }
//! ```

pub mod bedrockagent;
pub mod codecommit;
pub mod config;
pub mod credentials;
pub mod error;
pub mod signer;
pub mod tagging;
pub mod transport;

// Re-exports for convenience
pub use bedrockagent::{BedrockAgentApi, BedrockAgentClient, MockBedrockAgent};
pub use codecommit::{CodeCommitApi, CodeCommitClient, GetRepositoryInput, MockCodeCommit};
pub use config::{BEDROCK_AGENT, CODECOMMIT, ClientConfig, Service};
pub use credentials::{Credentials, CredentialsSource};
pub use error::{ApiError, ClientError, Result};
pub use tagging::ResourceTagger;
