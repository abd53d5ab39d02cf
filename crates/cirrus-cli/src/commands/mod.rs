//! CLI commands

pub mod apply;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod resources;
pub mod schema;
pub mod state;
pub mod validate;

use cirrus_client::{MockBedrockAgent, MockCodeCommit};
use cirrus_provider::{Clients, Configuration, FileStateStore, Provider, Workspace};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CliError, Result};

/// Files every command works on
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: PathBuf,
    pub state_path: PathBuf,
}

impl Context {
    pub fn new(config_path: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            state_path: state_path.into(),
        }
    }

    /// Parse the workspace file
    pub fn load_config(&self) -> Result<Configuration> {
        if !self.config_path.exists() {
            return Err(CliError::Config {
                message: format!("{} not found", self.config_path.display()),
                help: Some("Pass the workspace file with -f or set CIRRUS_CONFIG".to_string()),
            });
        }
        Ok(Configuration::load(&self.config_path)?)
    }

    pub fn store(&self) -> FileStateStore {
        FileStateStore::new(&self.state_path)
    }

    /// Workspace talking to the real services described by `config`
    pub fn connect(&self, config: &Configuration) -> Result<Workspace<FileStateStore>> {
        let provider_config = config.provider.clone().with_env();
        debug!(
            region = %provider_config.client.region,
            state = %self.state_path.display(),
            "connecting"
        );
        let provider = Provider::new(Clients::connect(&provider_config)?)?;
        Ok(Workspace::new(provider, self.store()))
    }

    /// Workspace for commands that never call a service
    pub fn offline(&self) -> Result<Workspace<FileStateStore>> {
        Ok(Workspace::new(offline_provider()?, self.store()))
    }
}

/// Provider backed by in-memory services, for schemas and validation
pub fn offline_provider() -> Result<Provider> {
    Ok(Provider::new(Clients::in_memory(
        MockCodeCommit::new(),
        MockBedrockAgent::new(),
    ))?)
}

pub fn relative_display(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
