//! # Environment Variable Loader
//!
//! Loads configuration from environment variables following 12-factor app
//! principles.
//!
//! # Naming Convention
//! All variables share the `CS_` prefix:
//! - `CS_PROVIDER`: Active provider
//! - `CS_FS_*`, `CS_GIT_*`, `CS_VAULT_*`, `CS_MONGODB_*`, `CS_URL_*`: Backend settings
//! - `CS_HTTP_*`, `CS_PROXY_*`: Outbound HTTP settings
//! - `CS_SERVER_*`: Listening socket
//! - `CS_LOG_LEVEL`, `CS_METRICS_ENABLED`: Observability

use crate::config::{
    Config, FilesystemConfig, GitConfig, HttpConfig, MongodbConfig, ObservabilityConfig,
    ProviderConfig, ProviderKind, ProxyConfig, ServerConfig, UrlConfig, VaultConfig,
};
use crate::file_loader::ConfigFileError;
use std::env;

/// Load configuration from environment variables.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads configuration from environment variables. Unset variables keep the
/// default value; the precedence merge only applies values that differ from
/// the defaults.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_env()?;
///     println!("provider = {}", config.provider.kind);
///     Ok(())
/// }
/// ```
///
/// ## Environment Variables
/// ### Provider
/// - `CS_PROVIDER`: filesystem/git/vault/mongodb/url (default: vault)
/// - `CS_FS_SERVICE_CONFIGS_DIR`: Filesystem root (default: "/light-service-configs")
/// - `CS_GIT_API_HOST`: Git API base URL (default: "https://api.github.com")
/// - `CS_GIT_API_CONTEXT_ROOT`: Git API context root (default: "repos")
/// - `CS_GIT_REPO_OWNER`: Repository owner
/// - `CS_GIT_REPO_NAME`: Repository name template (optional)
/// - `CS_VAULT_SERVER_URI`: Vault address (default: "http://localhost:8200")
/// - `CS_MONGODB_URI`, `CS_MONGODB_DATABASE`, `CS_MONGODB_COLLECTION`
/// - `CS_URL_SERVICE_CONFIGS_HOST`, `CS_URL_SERVICE_CONFIGS_DIR`
///
/// ### HTTP
/// - `CS_HTTP_TIMEOUT_SECONDS` (default: 10)
/// - `CS_HTTP_POOL_IDLE_TIMEOUT_SECONDS` (default: 10)
/// - `CS_PROXY_ENABLED`, `CS_PROXY_SCHEME`, `CS_PROXY_HOSTNAME`, `CS_PROXY_PORT`
///
/// ### Server
/// - `CS_SERVER_HOST` (default: "0.0.0.0")
/// - `CS_SERVER_PORT` (default: 8080)
///
/// ### Observability
/// - `CS_LOG_LEVEL`: trace/debug/info/warn/error (default: "info")
/// - `CS_METRICS_ENABLED`: true/false (default: true)
///
/// ## Error Handling
/// An unknown `CS_PROVIDER` is rejected. Other unparsable values fall back
/// to their defaults.
pub fn load_from_env() -> Result<Config, ConfigFileError> {
    let config = Config {
        provider: load_provider_from_env()?,
        http: load_http_from_env(),
        server: load_server_from_env(),
        observability: load_observability_from_env(),
    };

    Ok(config)
}

fn load_provider_from_env() -> Result<ProviderConfig, ConfigFileError> {
    let kind = match env::var("CS_PROVIDER") {
        Ok(value) => value
            .trim()
            .parse::<ProviderKind>()
            .map_err(|e| ConfigFileError::InvalidValue {
                key: "CS_PROVIDER".to_string(),
                reason: format!(
                    "{}: {}. Valid options: filesystem, git, vault, mongodb, url",
                    e, value
                ),
            })?,
        Err(_) => ProviderKind::default(),
    };

    let git_defaults = GitConfig::default();
    let mongodb_defaults = MongodbConfig::default();

    Ok(ProviderConfig {
        kind,
        filesystem: FilesystemConfig {
            service_configs_dir: env::var("CS_FS_SERVICE_CONFIGS_DIR")
                .unwrap_or_else(|_| FilesystemConfig::default().service_configs_dir),
        },
        git: GitConfig {
            api_host: env::var("CS_GIT_API_HOST").unwrap_or(git_defaults.api_host),
            api_context_root: env::var("CS_GIT_API_CONTEXT_ROOT")
                .unwrap_or(git_defaults.api_context_root),
            repo_owner: env::var("CS_GIT_REPO_OWNER").unwrap_or_default(),
            repo_name: env::var("CS_GIT_REPO_NAME").ok(),
        },
        vault: VaultConfig {
            server_uri: env::var("CS_VAULT_SERVER_URI")
                .unwrap_or_else(|_| VaultConfig::default().server_uri),
        },
        mongodb: MongodbConfig {
            uri: env::var("CS_MONGODB_URI").unwrap_or(mongodb_defaults.uri),
            database: env::var("CS_MONGODB_DATABASE").unwrap_or(mongodb_defaults.database),
            collection: env::var("CS_MONGODB_COLLECTION").unwrap_or(mongodb_defaults.collection),
        },
        url: UrlConfig {
            service_configs_host: env::var("CS_URL_SERVICE_CONFIGS_HOST").unwrap_or_default(),
            service_configs_dir: env::var("CS_URL_SERVICE_CONFIGS_DIR").unwrap_or_default(),
        },
    })
}

fn load_http_from_env() -> HttpConfig {
    let defaults = HttpConfig::default();
    HttpConfig {
        timeout_seconds: parse_env("CS_HTTP_TIMEOUT_SECONDS").unwrap_or(defaults.timeout_seconds),
        pool_idle_timeout_seconds: parse_env("CS_HTTP_POOL_IDLE_TIMEOUT_SECONDS")
            .unwrap_or(defaults.pool_idle_timeout_seconds),
        proxy: ProxyConfig {
            enabled: parse_env("CS_PROXY_ENABLED").unwrap_or(defaults.proxy.enabled),
            scheme: env::var("CS_PROXY_SCHEME").unwrap_or(defaults.proxy.scheme),
            hostname: env::var("CS_PROXY_HOSTNAME").unwrap_or(defaults.proxy.hostname),
            port: parse_env("CS_PROXY_PORT").unwrap_or(defaults.proxy.port),
        },
    }
}

fn load_server_from_env() -> ServerConfig {
    let defaults = ServerConfig::default();
    ServerConfig {
        host: env::var("CS_SERVER_HOST").unwrap_or(defaults.host),
        port: parse_env("CS_SERVER_PORT").unwrap_or(defaults.port),
    }
}

fn load_observability_from_env() -> ObservabilityConfig {
    let defaults = ObservabilityConfig::default();
    ObservabilityConfig {
        logging_level: env::var("CS_LOG_LEVEL").unwrap_or(defaults.logging_level),
        metrics_enabled: parse_env("CS_METRICS_ENABLED").unwrap_or(defaults.metrics_enabled),
    }
}

fn parse_env<T>(key: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(s) => s
            .parse::<T>()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>),
    }
}
