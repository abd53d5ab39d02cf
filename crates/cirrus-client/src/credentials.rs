//! Credential resolution
//!
//! Credentials come from one of:
//! - static keys in the provider configuration
//! - the `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` environment variables
//! - a profile of the shared credentials file (`~/.aws/credentials`)
//! - nowhere, for unsigned requests against local fakes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ClientError, Result};

/// Where credentials are resolved from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CredentialsSource {
    /// Keys written in the configuration
    Static {
        access_key_id: String,
        secret_access_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_token: Option<String>,
    },

    /// Standard environment variables
    #[default]
    Environment,

    /// Shared credentials file profile
    Profile {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },

    /// Send requests unsigned
    Anonymous,
}

impl CredentialsSource {
    pub fn static_keys(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        CredentialsSource::Static {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Resolve to signing credentials; `None` means requests go unsigned
    pub fn resolve(&self) -> Result<Option<Credentials>> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Credentials>> {
        match self {
            CredentialsSource::Static {
                access_key_id,
                secret_access_key,
                session_token,
            } => Ok(Some(Credentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                session_token: session_token.clone(),
            })),
            CredentialsSource::Environment => {
                let access_key_id = lookup("AWS_ACCESS_KEY_ID").ok_or_else(|| missing_env("AWS_ACCESS_KEY_ID"))?;
                let secret_access_key =
                    lookup("AWS_SECRET_ACCESS_KEY").ok_or_else(|| missing_env("AWS_SECRET_ACCESS_KEY"))?;
                Ok(Some(Credentials {
                    access_key_id,
                    secret_access_key,
                    session_token: lookup("AWS_SESSION_TOKEN"),
                }))
            }
            CredentialsSource::Profile { name, path } => {
                let name = name
                    .clone()
                    .or_else(|| lookup("AWS_PROFILE"))
                    .unwrap_or_else(|| "default".to_string());
                let path = match path {
                    Some(path) => path.clone(),
                    None => default_credentials_path()?,
                };
                load_profile(&path, &name).map(Some)
            }
            CredentialsSource::Anonymous => Ok(None),
        }
    }
}

fn missing_env(var: &str) -> ClientError {
    ClientError::Credentials {
        message: format!("Environment variable {} not set", var),
    }
}

/// Resolved signing credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Default location of the shared credentials file
pub fn default_credentials_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| ClientError::Credentials {
        message: "Could not determine home directory".to_string(),
    })?;
    Ok(home.join(".aws").join("credentials"))
}

/// Load one profile from a shared credentials file
pub fn load_profile(path: &Path, profile: &str) -> Result<Credentials> {
    let content = std::fs::read_to_string(path).map_err(|e| ClientError::Credentials {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let sections = parse_ini(&content);
    let section = sections.get(profile).ok_or_else(|| ClientError::Credentials {
        message: format!("Profile '{}' not found in {}", profile, path.display()),
    })?;

    let field = |key: &str| {
        section.get(key).cloned().ok_or_else(|| ClientError::Credentials {
            message: format!("Profile '{}' has no {}", profile, key),
        })
    };

    Ok(Credentials {
        access_key_id: field("aws_access_key_id")?,
        secret_access_key: field("aws_secret_access_key")?,
        session_token: section.get("aws_session_token").cloned(),
    })
}

fn parse_ini(content: &str) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            // config-file style headers ("profile dev") name the same profile
            let name = name.strip_prefix("profile ").unwrap_or(name).trim();
            sections.entry(name.to_string()).or_default();
            current = Some(name.to_string());
            continue;
        }

        if let (Some(section), Some((key, value))) = (&current, line.split_once('=')) {
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_source() {
        let creds = CredentialsSource::Environment
            .resolve_with(|key| match key {
                "AWS_ACCESS_KEY_ID" => Some("AKIDEXAMPLE".to_string()),
                "AWS_SECRET_ACCESS_KEY" => Some("secret".to_string()),
                _ => None,
            })
            .unwrap()
            .unwrap();

        assert_eq!(creds.access_key_id, "AKIDEXAMPLE");
        assert_eq!(creds.session_token, None);

        let err = CredentialsSource::Environment.resolve_with(|_| None).unwrap_err();
        assert!(err.to_string().contains("AWS_ACCESS_KEY_ID"));
    }

    #[test]
    fn test_anonymous_is_unsigned() {
        assert!(CredentialsSource::Anonymous.resolve_with(|_| None).unwrap().is_none());
    }

    #[test]
    fn test_profile_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        std::fs::write(
            &path,
            "# shared credentials\n[default]\naws_access_key_id = AKIDDEFAULT\naws_secret_access_key = s1\n\n[profile dev]\naws_access_key_id=AKIDDEV\naws_secret_access_key=s2\naws_session_token=token\n",
        )
        .unwrap();

        let source = CredentialsSource::Profile {
            name: Some("dev".to_string()),
            path: Some(path.clone()),
        };
        let creds = source.resolve_with(|_| None).unwrap().unwrap();
        assert_eq!(creds.access_key_id, "AKIDDEV");
        assert_eq!(creds.session_token.as_deref(), Some("token"));

        let source = CredentialsSource::Profile { name: None, path: Some(path.clone()) };
        let creds = source.resolve_with(|_| None).unwrap().unwrap();
        assert_eq!(creds.access_key_id, "AKIDDEFAULT");

        let missing = load_profile(&path, "prod").unwrap_err();
        assert!(missing.to_string().contains("Profile 'prod' not found"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("AKIDEXAMPLE", "very-secret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn test_source_yaml() {
        let source: CredentialsSource =
            serde_yaml::from_str("type: static\naccess_key_id: AKID\nsecret_access_key: s\n").unwrap();
        assert_eq!(source, CredentialsSource::static_keys("AKID", "s"));
    }
}
