//! # Configuration File Loading
//!
//! Loads configuration from TOML or YAML files.
//!
//! Supports automatic format detection based on file extension.

use crate::config::Config;
use std::path::Path;

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(String),

    #[error("Config file has no extension")]
    NoExtension,

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Load configuration from TOML file.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads configuration from a TOML format file. Missing sections and fields
/// take their defaults.
///
/// ## Error Handling
/// Returns `ConfigFileError` for:
/// - File not found
/// - Invalid TOML syntax
pub fn load_from_toml(path: &Path) -> Result<Config, ConfigFileError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|_e| ConfigFileError::FileNotFound(path.display().to_string()))?;

    let config: Config =
        toml::from_str(&contents).map_err(|e| ConfigFileError::TomlParse(e.to_string()))?;

    Ok(config)
}

/// Load configuration from YAML file.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads configuration from a YAML format file. Missing sections and fields
/// take their defaults; an empty file yields the default configuration.
///
/// ## Error Handling
/// Returns `ConfigFileError` for:
/// - File not found
/// - Invalid YAML syntax
pub fn load_from_yaml(path: &Path) -> Result<Config, ConfigFileError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|_e| ConfigFileError::FileNotFound(path.display().to_string()))?;

    if contents.trim().is_empty() {
        return Ok(Config::default());
    }

    let config: Config =
        serde_yaml::from_str(&contents).map_err(|e| ConfigFileError::YamlParse(e.to_string()))?;

    Ok(config)
}

/// Load configuration from file with auto-detection.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads configuration from file, detecting the format from the extension.
///
/// ## Supported Formats
/// - `.toml`: TOML format
/// - `.yaml`: YAML format
/// - `.yml`: YAML format
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_file;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_file(Path::new("config-server.yml"))?;
///     println!("provider = {}", config.provider.kind);
///     Ok(())
/// }
/// ```
pub fn load_from_file(path: &Path) -> Result<Config, ConfigFileError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or(ConfigFileError::NoExtension)?;

    match extension.to_lowercase().as_str() {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        other => Err(ConfigFileError::UnsupportedFormat(other.to_string())),
    }
}
