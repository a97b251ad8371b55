//! Project configuration: the JSON file that lives in a project's hidden
//! data directory alongside the Graph Store database.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Schema major version for configuration. Bump when a breaking change to
/// the JSON shape ships.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Name of the hidden directory created at a project root by `init`.
pub const DATA_DIR_NAME: &str = ".codegraph";

/// Database filename within the data directory.
pub const DB_FILENAME: &str = "graph.db";

/// Config filename within the data directory.
pub const CONFIG_FILENAME: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config at {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("failed to write config at {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },

    #[error("unsupported config schema version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkStrategy {
    /// Chunk boundaries follow AST node boundaries exactly.
    Ast,
    /// AST boundaries with surrounding context merged in for small nodes.
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default = "default_chunk_strategy")]
    pub chunk_strategy: ChunkStrategy,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_include() -> Vec<String> {
    vec!["**/*".to_string()]
}

fn default_chunk_strategy() -> ChunkStrategy {
    ChunkStrategy::Ast
}

fn default_max_file_size() -> u64 {
    2 * 1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: CONFIG_SCHEMA_VERSION,
            include: default_include(),
            exclude: Vec::new(),
            frameworks: Vec::new(),
            embedding_model: None,
            chunk_strategy: default_chunk_strategy(),
            max_file_size: default_max_file_size(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        if config.version != CONFIG_SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedVersion { found: config.version, expected: CONFIG_SCHEMA_VERSION });
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self).expect("Config always serializes");
        std::fs::write(path, text).map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }
}

/// Paths to the files `init` creates under a project root.
pub struct ProjectLayout {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: &Path) -> Self {
        let data_dir = root.join(DATA_DIR_NAME);
        ProjectLayout { db_path: data_dir.join(DB_FILENAME), config_path: data_dir.join(CONFIG_FILENAME), data_dir }
    }
}
