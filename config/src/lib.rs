//! # Configuration System
//!
//! Centralized configuration management for the config server.
//!
//! This crate provides:
//! - Configuration structures for the provider, HTTP client, server and
//!   observability
//! - Environment variable loading (12-factor app principles)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (CLI > env > file > defaults)
//! - Configuration validation
//!
//! # Best Practices
//!
//! - Uses `validator` crate for input validation
//! - Follows 12-factor app configuration principles
//! - Provides clear error messages for invalid configuration
//! - Never logs connection strings in clear

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validation;

pub use config::{
    Config, FilesystemConfig, GitConfig, HttpConfig, MongodbConfig, ObservabilityConfig,
    ProviderConfig, ProviderKind, ProxyConfig, ServerConfig, UrlConfig, VaultConfig,
};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::load_from_env;
pub use precedence::{CliOverrides, LayeredConfig, SourceChanges, load_layered, merge_configs};
pub use validation::validate;
