//! CLI configuration handling.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use mailtether_core::ApiConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// API host override. When absent the built-in default host is used.
    #[serde(default)]
    pub api_host: Option<String>,

    /// Identifier of the operator that owns provisioned application passwords.
    #[serde(default = "default_operator_id")]
    pub operator_id: u64,

    /// Path to the JSON file backing the option store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_operator_id() -> u64 {
    1
}

fn default_store_path() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().join("options.json"))
        .unwrap_or_else(|| PathBuf::from(".mailtether/options.json"))
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_host: None,
            operator_id: default_operator_id(),
            store_path: default_store_path(),
            config_path: PathBuf::new(),
        }
    }
}

impl CliConfig {
    /// Resolve the API configuration, validating any host override.
    pub fn api_config(&self) -> Result<ApiConfig> {
        match &self.api_host {
            Some(host) => ApiConfig::from_host_str(host)
                .with_context(|| format!("Invalid api_host {:?} in {:?}", host, self.config_path)),
            None => Ok(ApiConfig::default()),
        }
    }
}

/// Load configuration from the default location or create defaults.
pub fn load_config() -> Result<CliConfig> {
    let config_path = project_dirs()
        .map(|d| d.config_dir().join("mailtether.toml"))
        .unwrap_or_else(|| PathBuf::from("mailtether.toml"));

    load_config_from(config_path)
}

/// Load configuration from an explicit path, falling back to defaults
/// when the file does not exist.
pub fn load_config_from(config_path: PathBuf) -> Result<CliConfig> {
    let mut config = if config_path.exists() {
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))?
    } else {
        CliConfig::default()
    };

    config.config_path = config_path;

    // The file store creates missing parent directories on first write.
    Ok(config)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "mailtether")
}
