//! Configuration loading.
//!
//! A `Config` is deserialized from a YAML file; paths are resolved
//! relative to the config file's own location the same way a vault path
//! would be resolved relative to wherever the config lives.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// The configuration surface consumed by the core components. The core
/// treats all of this as opaque input; it never parses CLI args or env
/// vars itself — that belongs to `wiki-cli`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Vault root directory, resolved relative to the config file.
    pub vault: PathBuf,

    /// Slug to treat as the site home page.
    #[serde(default = "default_home_slug")]
    pub home_slug: String,

    /// Whether to start the filesystem watcher.
    #[serde(default = "default_true")]
    pub watch: bool,

    /// Notes with no explicit `publish` field (and no folder default)
    /// resolve to this visibility.
    #[serde(default)]
    pub public_by_default: bool,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_home_slug() -> String {
    "index".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Identifier of the embedding model in use; a change invalidates
    /// the persisted tracker (`I5`).
    #[serde(default)]
    pub model_identifier: Option<String>,

    /// Where `EmbeddingsTracker` persists its JSON record, relative to
    /// the config file unless absolute.
    #[serde(default = "default_tracker_path")]
    pub tracker_path: PathBuf,

    /// Vector store endpoint, opaque to core (consumed by a `VectorStore`
    /// collaborator implementation).
    #[serde(default)]
    pub vector_store_endpoint: Option<String>,

    #[serde(default)]
    pub vector_store_index: Option<String>,

    /// Chat/completions model identifier, opaque to core.
    #[serde(default)]
    pub chat_model_identifier: Option<String>,
}

fn default_tracker_path() -> PathBuf {
    PathBuf::from(".wiki-vault/embeddings-tracker.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

fn default_port() -> u16 {
    8000
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Vault directory, resolved relative to the config file location.
    pub fn vault_dir(&self) -> PathBuf {
        self.resolve_path(&self.vault)
    }

    pub fn tracker_path(&self) -> PathBuf {
        self.resolve_path(&self.embedding.tracker_path)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.config_path {
            Some(config_path) => match config_path.parent() {
                Some(parent) => parent.join(path),
                None => path.to_path_buf(),
            },
            None => path.to_path_buf(),
        }
    }
}
