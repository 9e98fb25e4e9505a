use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fjall::Keyspace;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

#[derive(Clone, Default, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) server: ServerConfig,
    pub(crate) storage: StorageConfig,
    pub(crate) api: ApiConfig,
    pub(crate) export: ExportConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct ServerConfig {
    pub(crate) http_port: u16,
    /// Prefix of every minted IRI, without trailing slash
    pub(crate) base_url: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct StorageConfig {
    pub(crate) data_dir: PathBuf,
}

#[derive(Clone, Default, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct ApiConfig {
    pub(crate) tokens: Vec<SecretString>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct ExportConfig {
    pub(crate) default_language: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8000,
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
        }
    }
}

impl Config {
    pub(crate) fn from_file(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        Config::from_toml(&text)
    }

    pub(crate) fn from_toml(text: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(text).context("invalid config file")?;
        config.server.base_url = config.server.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }
}

impl ApiConfig {
    pub(crate) fn accepts(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t.expose_secret() == token)
    }
}

/// Parsed configuration plus the opened storage.
#[derive(Clone)]
pub(crate) struct RuntimeConfig {
    pub(crate) init: Config,
    pub(crate) keyspace: Keyspace,
}
