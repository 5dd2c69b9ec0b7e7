//! # Configuration Validation
//!
//! Provides validation for all configuration structures using the `validator` crate.

use crate::config::Config;
use validator::Validate;

/// Validate configuration structure.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Validates all configuration fields using the `validator` crate.
///
/// ## Validation Rules
/// ### Provider
/// - The section of the active provider must be complete:
///   - filesystem: `service_configs_dir`
///   - git: `api_host`, `api_context_root`, `repo_owner`
///   - vault: `server_uri`
///   - mongodb: `uri`, `database`, `collection`
///   - url: `service_configs_host`
///
/// ### HTTP
/// - `timeout_seconds`: 1-300
/// - `pool_idle_timeout_seconds`: 1-300
/// - `proxy`: when enabled, non-empty `hostname`, non-zero `port`, scheme
///   "http", "https" or "socks5"
///
/// ### Server
/// - `host`: 1-255 characters
/// - `port`: 1-65535
///
/// ### Observability
/// - `logging_level`: must be "trace", "debug", "info", "warn", or "error"
pub fn validate(config: &Config) -> Result<(), validator::ValidationErrors> {
    config.validate()
}
