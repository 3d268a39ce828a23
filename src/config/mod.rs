//! Integration configuration resolved from the environment at startup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Configuration errors; all of these are fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(String),
    #[error("environment variable {0} is empty")]
    EmptyVar(String),
    #[error("failed to create share root directory {path}: {source}")]
    ShareRoot {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Credentials and endpoints for both platforms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Transfer-service workspace domain, e.g. `https://acme.accsyn.com`
    pub accsyn_domain: String,
    pub accsyn_api_user: String,
    pub accsyn_api_key: String,

    /// Asset-tracking server URL
    pub ftrack_server_url: String,
    pub ftrack_api_user: String,
    pub ftrack_api_key: String,
}

impl IntegrationConfig {
    /// Resolve configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&vars)
    }

    /// Resolve configuration from an arbitrary variable map
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Ok(Self {
            accsyn_domain: required(vars, "ACCSYN_DOMAIN")?,
            accsyn_api_user: required(vars, "ACCSYN_API_USER")?,
            accsyn_api_key: required(vars, "ACCSYN_API_KEY")?,
            ftrack_server_url: required(vars, "FTRACK_SERVER")?,
            ftrack_api_user: required(vars, "FTRACK_API_USER")?,
            ftrack_api_key: required(vars, "FTRACK_API_KEY")?,
        })
    }
}

/// Resolve the local filesystem root for a share from the environment and
/// make sure the directory exists.
///
/// The variable name is derived from the share code
/// (`ACCSYN_{SHARE_CODE}_PATH`); a missing variable is a startup failure,
/// never a runtime condition of the coordinator.
pub fn resolve_share_root(
    vars: &HashMap<String, String>,
    env_var: &str,
) -> Result<PathBuf, ConfigError> {
    let raw = required(vars, env_var)?;
    let path = PathBuf::from(raw);
    if !path.exists() {
        info!("Creating share root directory {}", path.display());
        std::fs::create_dir_all(&path).map_err(|source| ConfigError::ShareRoot {
            path: path.clone(),
            source,
        })?;
    }
    Ok(path)
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    match vars.get(name) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyVar(name.to_string())),
        Some(value) => Ok(value.clone()),
        None => Err(ConfigError::MissingVar(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_map() -> HashMap<String, String> {
        [
            ("ACCSYN_DOMAIN", "https://acme.accsyn.com"),
            ("ACCSYN_API_USER", "pipeline@acme.com"),
            ("ACCSYN_API_KEY", "secret"),
            ("FTRACK_SERVER", "https://acme.ftrackapp.com"),
            ("FTRACK_API_USER", "pipeline@acme.com"),
            ("FTRACK_API_KEY", "secret2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn resolves_full_configuration() {
        let config = IntegrationConfig::from_map(&full_map()).unwrap();
        assert_eq!(config.accsyn_domain, "https://acme.accsyn.com");
        assert_eq!(config.ftrack_api_key, "secret2");
    }

    #[test]
    fn missing_variable_is_fatal() {
        let mut vars = full_map();
        vars.remove("ACCSYN_API_KEY");
        let err = IntegrationConfig::from_map(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(name) if name == "ACCSYN_API_KEY"));
    }

    #[test]
    fn empty_variable_is_fatal() {
        let mut vars = full_map();
        vars.insert("FTRACK_SERVER".into(), "  ".into());
        let err = IntegrationConfig::from_map(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyVar(name) if name == "FTRACK_SERVER"));
    }

    #[test]
    fn share_root_is_created_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("staging");
        let vars: HashMap<String, String> = [(
            "ACCSYN_PROJECTS_PATH".to_string(),
            root.to_string_lossy().to_string(),
        )]
        .into_iter()
        .collect();

        let resolved = resolve_share_root(&vars, "ACCSYN_PROJECTS_PATH").unwrap();
        assert_eq!(resolved, root);
        assert!(root.is_dir());
    }

    #[test]
    fn share_root_missing_variable_is_fatal() {
        let vars = HashMap::new();
        assert!(resolve_share_root(&vars, "ACCSYN_PROJECTS_PATH").is_err());
    }
}
