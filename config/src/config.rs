//! # Configuration Structures
//!
//! This module defines all configuration structures for the config server.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Carry defaults so a partial file is enough to start

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Main configuration structure for the config server.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Aggregates the provider selection, outbound HTTP behaviour, the listening
/// socket and observability settings.
///
/// ## Usage
/// ```rust,no_run
/// use config::Config;
///
/// let config = Config::default();
/// println!("Active provider: {}", config.provider.kind);
/// ```
///
/// ## Fields
/// - `provider`: Which backend serves configuration and how to reach it
/// - `http`: Timeouts and proxy for HTTP-backed providers
/// - `server`: Listening address of the HTTP boundary
/// - `observability`: Logging level and metrics switch
///
/// ## Validation
/// All nested configurations must pass their own validation rules.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    #[validate(nested)]
    pub provider: ProviderConfig,

    #[serde(default)]
    #[validate(nested)]
    pub http: HttpConfig,

    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,

    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

/// Backend serving configuration, selected once at start.
///
/// Parsing is case-insensitive and accepts the short aliases `fs`, `file`,
/// `github`, `mongo` and `http`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    #[strum(to_string = "filesystem", serialize = "fs", serialize = "file")]
    Filesystem,
    #[strum(to_string = "git", serialize = "github")]
    Git,
    #[default]
    Vault,
    #[strum(to_string = "mongodb", serialize = "mongo")]
    Mongodb,
    #[strum(to_string = "url", serialize = "http")]
    Url,
}

/// Provider selection and per-backend settings.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Holds the settings of every backend; only the section matching `kind` is
/// required to be complete.
///
/// ## Fields
/// - `kind`: Active backend (default: vault)
/// - `filesystem`, `git`, `vault`, `mongodb`, `url`: Backend sections
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
#[validate(schema(function = "validate_active_provider"))]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    #[serde(default)]
    pub filesystem: FilesystemConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub vault: VaultConfig,

    #[serde(default)]
    pub mongodb: MongodbConfig,

    #[serde(default)]
    pub url: UrlConfig,
}

fn require(value: &str, code: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(code));
    }
    Ok(())
}

fn validate_active_provider(config: &ProviderConfig) -> Result<(), ValidationError> {
    match config.kind {
        ProviderKind::Filesystem => require(
            &config.filesystem.service_configs_dir,
            "filesystem_service_configs_dir_required",
        ),
        ProviderKind::Git => {
            require(&config.git.api_host, "git_api_host_required")?;
            require(&config.git.api_context_root, "git_api_context_root_required")?;
            require(&config.git.repo_owner, "git_repo_owner_required")
        }
        ProviderKind::Vault => require(&config.vault.server_uri, "vault_server_uri_required"),
        ProviderKind::Mongodb => {
            require(&config.mongodb.uri, "mongodb_uri_required")?;
            require(&config.mongodb.database, "mongodb_database_required")?;
            require(&config.mongodb.collection, "mongodb_collection_required")
        }
        ProviderKind::Url => require(
            &config.url.service_configs_host,
            "url_service_configs_host_required",
        ),
    }
}

/// Local directory tree backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilesystemConfig {
    /// Root of the `<category>/<project>/<scope>/<version>/<env>` tree
    #[serde(default = "default_filesystem_service_configs_dir")]
    pub service_configs_dir: String,
}

fn default_filesystem_service_configs_dir() -> String {
    "/light-service-configs".to_string()
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            service_configs_dir: default_filesystem_service_configs_dir(),
        }
    }
}

/// Git hosting REST API backend.
///
/// # M-CANONICAL-DOCS
///
/// ## Fields
/// - `api_host`: Base URL of the contents API (default: "https://api.github.com")
/// - `api_context_root`: Path segment before the owner (default: "repos")
/// - `repo_owner`: Organisation or user owning the config repositories
/// - `repo_name`: Optional template with `{projectName}` and `{environment}`
///   placeholders; absent means `light-service-configs-{projectName}-{environment}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitConfig {
    #[serde(default = "default_git_api_host")]
    pub api_host: String,

    #[serde(default = "default_git_api_context_root")]
    pub api_context_root: String,

    #[serde(default)]
    pub repo_owner: String,

    #[serde(default)]
    pub repo_name: Option<String>,
}

fn default_git_api_host() -> String {
    "https://api.github.com".to_string()
}

fn default_git_api_context_root() -> String {
    "repos".to_string()
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            api_host: default_git_api_host(),
            api_context_root: default_git_api_context_root(),
            repo_owner: String::new(),
            repo_name: None,
        }
    }
}

/// Vault KV v2 backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaultConfig {
    #[serde(default = "default_vault_server_uri")]
    pub server_uri: String,
}

fn default_vault_server_uri() -> String {
    "http://localhost:8200".to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            server_uri: default_vault_server_uri(),
        }
    }
}

/// MongoDB document backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MongodbConfig {
    /// Connection string; may embed credentials and is masked in logs
    #[serde(default = "default_mongodb_uri")]
    pub uri: String,

    #[serde(default = "default_mongodb_database")]
    pub database: String,

    #[serde(default = "default_mongodb_collection")]
    pub collection: String,
}

fn default_mongodb_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_mongodb_database() -> String {
    "configserver".to_string()
}

fn default_mongodb_collection() -> String {
    "configs".to_string()
}

impl Default for MongodbConfig {
    fn default() -> Self {
        Self {
            uri: default_mongodb_uri(),
            database: default_mongodb_database(),
            collection: default_mongodb_collection(),
        }
    }
}

/// Remote HTTP directory backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UrlConfig {
    /// Scheme and authority, e.g. `http://configs.internal:8080`
    #[serde(default)]
    pub service_configs_host: String,

    /// Path prefix prepended to every address
    #[serde(default)]
    pub service_configs_dir: String,
}

/// Outbound HTTP client settings shared by the Git, Vault and URL providers.
///
/// # M-CANONICAL-DOCS
///
/// ## Fields
/// - `timeout_seconds`: Whole-request timeout (default: 10, 1-300)
/// - `pool_idle_timeout_seconds`: Idle connection lifetime (default: 10, 1-300)
/// - `proxy`: Optional forward proxy
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout_seconds")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_seconds: u64,

    #[serde(default = "default_http_pool_idle_timeout_seconds")]
    #[validate(range(min = 1, max = 300))]
    pub pool_idle_timeout_seconds: u64,

    #[serde(default)]
    #[validate(nested)]
    pub proxy: ProxyConfig,
}

fn default_http_timeout_seconds() -> u64 {
    10
}

fn default_http_pool_idle_timeout_seconds() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout_seconds(),
            pool_idle_timeout_seconds: default_http_pool_idle_timeout_seconds(),
            proxy: ProxyConfig::default(),
        }
    }
}

/// Forward proxy for outbound requests.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[validate(schema(function = "validate_proxy"))]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_proxy_scheme")]
    pub scheme: String,

    #[serde(default)]
    pub hostname: String,

    #[serde(default = "default_proxy_port")]
    pub port: u16,
}

fn default_proxy_scheme() -> String {
    "http".to_string()
}

fn default_proxy_port() -> u16 {
    3128
}

fn validate_proxy(proxy: &ProxyConfig) -> Result<(), ValidationError> {
    if !proxy.enabled {
        return Ok(());
    }
    require(&proxy.hostname, "proxy_hostname_required")?;
    if proxy.port == 0 {
        return Err(ValidationError::new("proxy_port_invalid"));
    }
    match proxy.scheme.as_str() {
        "http" | "https" | "socks5" => Ok(()),
        _ => Err(ValidationError::new("proxy_scheme_invalid")),
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scheme: default_proxy_scheme(),
            hostname: String::new(),
            port: default_proxy_port(),
        }
    }
}

impl ProxyConfig {
    /// `scheme://hostname:port`, when the proxy is enabled.
    pub fn url(&self) -> Option<String> {
        self.enabled
            .then(|| format!("{}://{}:{}", self.scheme, self.hostname, self.port))
    }
}

/// Listening socket of the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    #[serde(default = "default_server_port")]
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Observability configuration.
///
/// # M-CANONICAL-DOCS
///
/// ## Fields
/// - `logging_level`: Default tracing directive (default: "info")
/// - `metrics_enabled`: Install the Prometheus recorder and serve `/metrics`
///   (default: true)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    #[serde(default = "default_observability_logging_level")]
    #[validate(custom(function = "validate_logging_level"))]
    pub logging_level: String,

    #[serde(default = "default_observability_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_observability_logging_level() -> String {
    "info".to_string()
}

fn default_observability_metrics_enabled() -> bool {
    true
}

fn validate_logging_level(value: &str) -> Result<(), ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("Invalid logging level")),
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging_level: default_observability_logging_level(),
            metrics_enabled: default_observability_metrics_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.provider.kind, ProviderKind::Vault);
        assert_eq!(config.provider.vault.server_uri, "http://localhost:8200");
        assert_eq!(config.provider.git.api_context_root, "repos");
        assert_eq!(config.http.timeout_seconds, 10);
        assert_eq!(config.http.pool_idle_timeout_seconds, 10);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.observability.logging_level, "info");
        assert!(config.observability.metrics_enabled);
    }

    #[test]
    fn test_provider_kind_round_trip() {
        for kind in [
            ProviderKind::Filesystem,
            ProviderKind::Git,
            ProviderKind::Vault,
            ProviderKind::Mongodb,
            ProviderKind::Url,
        ] {
            assert_eq!(ProviderKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert_eq!(
            ProviderKind::from_str("Mongo").unwrap(),
            ProviderKind::Mongodb
        );
    }

    #[test]
    fn test_provider_kind_aliases() {
        assert_eq!(ProviderKind::from_str("fs").unwrap(), ProviderKind::Filesystem);
        assert_eq!(ProviderKind::from_str("GitHub").unwrap(), ProviderKind::Git);
        assert_eq!(ProviderKind::from_str("http").unwrap(), ProviderKind::Url);
        assert_eq!(ProviderKind::Filesystem.to_string(), "filesystem");
        assert_eq!(ProviderKind::Mongodb.to_string(), "mongodb");
    }

    #[test]
    fn test_provider_kind_unknown() {
        assert!(ProviderKind::from_str("consul").is_err());
    }

    #[test]
    fn test_inactive_provider_sections_may_be_incomplete() {
        let config = Config::default();
        assert!(config.provider.git.repo_owner.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_active_git_requires_owner() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Git;
        assert!(config.validate().is_err());

        config.provider.git.repo_owner = "networknt".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_active_url_requires_host() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Url;
        assert!(config.validate().is_err());

        config.provider.url.service_configs_host = "http://cfg:8080".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_proxy_url() {
        let mut proxy = ProxyConfig::default();
        assert_eq!(proxy.url(), None);

        proxy.enabled = true;
        proxy.hostname = "proxy.internal".to_string();
        assert_eq!(proxy.url().as_deref(), Some("http://proxy.internal:3128"));
    }

    #[test]
    fn test_enabled_proxy_requires_hostname() {
        let mut config = Config::default();
        config.http.proxy.enabled = true;
        assert!(config.validate().is_err());

        config.http.proxy.hostname = "proxy.internal".to_string();
        assert!(config.validate().is_ok());

        config.http.proxy.scheme = "ftp".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = r#"
provider:
  kind: filesystem
  filesystem:
    service_configs_dir: /srv/configs
server:
  port: 9443
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Filesystem);
        assert_eq!(config.provider.filesystem.service_configs_dir, "/srv/configs");
        assert_eq!(config.server.port, 9443);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.http.timeout_seconds, 10);
    }
}
