//! Configuration loading and data folder resolution
//!
//! Settings are resolved in this order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and the
//! compiled defaults apply. A file that exists but does not parse is.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the data folder
pub const DATA_FOLDER_ENV: &str = "KITADOC_DATA_FOLDER";

const APP_DIR: &str = "kitadoc";

/// Contents of `config.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    #[serde(default = "ToolConfig::transcriber")]
    pub transcription: ToolConfig,
    #[serde(default = "ToolConfig::summarizer")]
    pub summarization: ToolConfig,
    pub upload: UploadConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            transcription: ToolConfig::transcriber(),
            summarization: ToolConfig::summarizer(),
            upload: UploadConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 4000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Backend used for one record collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_folder: Option<PathBuf>,
    pub patients: StorageMode,
    pub documentation: StorageMode,
    pub groups: StorageMode,
    /// Create the default groups when the group collection is empty
    pub seed_default_groups: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_folder: None,
            patients: StorageMode::File,
            documentation: StorageMode::File,
            groups: StorageMode::File,
            seed_default_groups: true,
        }
    }
}

/// External program invocation
///
/// `program` is required whenever the section is present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Kill the tool after this many seconds; unset means wait forever
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ToolConfig {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout_secs: None,
        }
    }

    /// Speech-to-text script; the audio path is appended as last argument
    pub fn transcriber() -> Self {
        Self::new("python3", &["python/transcribe.py"])
    }

    /// Local LLM reading the prompt from stdin
    pub fn summarizer() -> Self {
        Self::new("ollama", &["run", "mistral:latest"])
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

/// `<config_dir>/kitadoc/config.toml`, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Load the TOML config, falling back to defaults if the file does not exist
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// `<data_local_dir>/kitadoc`, or `./kitadoc_data` if the platform has none
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./kitadoc_data"))
}

/// Resolve the folder holding the JSON collections
pub fn resolve_data_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        debug!("Data folder from command line");
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        if !path.trim().is_empty() {
            debug!("Data folder from {}", DATA_FOLDER_ENV);
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.storage.data_folder {
        debug!("Data folder from config file");
        return path.clone();
    }

    default_data_folder()
}

/// Create `path` and its parents if missing
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(Error::Config(format!(
            "{} exists but is not a directory",
            path.display()
        )));
    }
    std::fs::create_dir_all(path)?;
    info!("Created data folder {}", path.display());
    Ok(())
}

/// Path of the JSON file backing one collection (`patients.json`)
pub fn collection_path(data_folder: &Path, collection: &str) -> PathBuf {
    data_folder.join(format!("{}.json", collection))
}
