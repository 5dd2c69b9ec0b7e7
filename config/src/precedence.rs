//! # Configuration Precedence
//!
//! Merges configuration from multiple sources with precedence rules.
//!
//! # Precedence Order
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values (lowest priority)

use crate::config::{
    Config, HttpConfig, ObservabilityConfig, ProviderConfig, ProviderKind, ServerConfig,
};
use crate::file_loader::{ConfigFileError, load_from_file};
use crate::loader::load_from_env;
use std::path::Path;
use validator::Validate;

const MASK: &str = "****";

/// Values given on the command line.
///
/// Unlike files and the environment, only the flags actually passed are
/// applied, so a flag equal to a default still wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub provider: Option<ProviderKind>,
}

/// Settings one source changed, with secrets masked.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceChanges {
    pub source: String,
    pub changes: Vec<String>,
}

impl SourceChanges {
    pub fn log(&self) {
        tracing::info!("Configuration from {}: {:?}", self.source, self.changes);
    }
}

/// Effective configuration plus what each source contributed.
///
/// Loading normally happens before a tracing subscriber exists, so the
/// changes are kept for the caller to log once one is installed.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: Config,
    pub sources: Vec<SourceChanges>,
}

impl LayeredConfig {
    pub fn log_sources(&self) {
        for source in &self.sources {
            source.log();
        }
    }
}

/// Builds the effective configuration from every source.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads the optional file, the environment and the CLI overrides, merges
/// them over the defaults and validates the result.
///
/// ## Usage
/// ```rust,no_run
/// use config::{CliOverrides, load_layered};
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let layered = load_layered(Some(Path::new("config-server.yml")), CliOverrides::default())?;
///     layered.log_sources();
///     let config = layered.config;
///     println!("listening on {}:{}", config.server.host, config.server.port);
///     Ok(())
/// }
/// ```
///
/// ## Error Handling
/// File errors, an unknown `CS_PROVIDER` and validation failures are
/// returned as `ConfigFileError`.
pub fn load_layered(
    file: Option<&Path>,
    cli: CliOverrides,
) -> Result<LayeredConfig, ConfigFileError> {
    let file_config = match file {
        Some(path) => load_from_file(path)?,
        None => Config::default(),
    };
    let env_config = load_from_env()?;

    let layered = merge_sources(Config::default(), file_config, "file", env_config, "env", cli);
    layered.config.validate()?;

    Ok(layered)
}

/// Merge multiple configuration sources with precedence.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Merges configuration from multiple sources following precedence rules:
/// CLI arguments > environment variables > config file > defaults.
///
/// ## Deep Merge
/// A file or environment value is applied when it differs from the default
/// and from the value already merged. Changes are logged per source with
/// connection strings masked.
pub fn merge_configs(
    defaults: Config,
    file_config: Config,
    file_source_name: &str,
    env_config: Config,
    env_source_name: &str,
    cli: CliOverrides,
) -> Config {
    let layered = merge_sources(
        defaults,
        file_config,
        file_source_name,
        env_config,
        env_source_name,
        cli,
    );
    layered.log_sources();
    layered.config
}

fn merge_sources(
    defaults: Config,
    file_config: Config,
    file_source_name: &str,
    env_config: Config,
    env_source_name: &str,
    cli: CliOverrides,
) -> LayeredConfig {
    let mut sources = Vec::new();

    let config = merge_source(defaults, file_config, file_source_name, &mut sources);
    let mut config = merge_source(config, env_config, env_source_name, &mut sources);
    apply_cli(&mut config, cli, &mut sources);

    LayeredConfig { config, sources }
}

fn merge_source(
    mut base: Config,
    override_config: Config,
    source_name: &str,
    sources: &mut Vec<SourceChanges>,
) -> Config {
    let mut changes = Vec::new();

    merge_provider(&mut base.provider, &override_config.provider, &mut changes);
    merge_http(&mut base.http, &override_config.http, &mut changes);
    merge_server(&mut base.server, &override_config.server, &mut changes);
    merge_observability(
        &mut base.observability,
        &override_config.observability,
        &mut changes,
    );

    if !changes.is_empty() {
        sources.push(SourceChanges {
            source: source_name.to_string(),
            changes,
        });
    }

    base
}

fn apply_cli(config: &mut Config, cli: CliOverrides, sources: &mut Vec<SourceChanges>) {
    let mut changes = Vec::new();

    if let Some(host) = cli.host {
        changes.push(format!("server.host = {}", host));
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        changes.push(format!("server.port = {}", port));
        config.server.port = port;
    }
    if let Some(kind) = cli.provider {
        changes.push(format!("provider.kind = {}", kind));
        config.provider.kind = kind;
    }

    if !changes.is_empty() {
        sources.push(SourceChanges {
            source: "cli".to_string(),
            changes,
        });
    }
}

fn merge_string(
    base: &mut String,
    value: &str,
    default: &str,
    name: &str,
    secret: bool,
    changes: &mut Vec<String>,
) {
    if value != default && value != base.as_str() {
        let shown = if secret { MASK } else { value };
        changes.push(format!("{} = {}", name, shown));
        *base = value.to_string();
    }
}

fn merge_value<T: PartialEq + Copy + std::fmt::Display>(
    base: &mut T,
    value: T,
    default: T,
    name: &str,
    changes: &mut Vec<String>,
) {
    if value != default && value != *base {
        changes.push(format!("{} = {}", name, value));
        *base = value;
    }
}

fn merge_provider(
    base: &mut ProviderConfig,
    override_config: &ProviderConfig,
    changes: &mut Vec<String>,
) {
    let defaults = ProviderConfig::default();

    merge_value(
        &mut base.kind,
        override_config.kind,
        defaults.kind,
        "provider.kind",
        changes,
    );
    merge_string(
        &mut base.filesystem.service_configs_dir,
        &override_config.filesystem.service_configs_dir,
        &defaults.filesystem.service_configs_dir,
        "provider.filesystem.service_configs_dir",
        false,
        changes,
    );
    merge_string(
        &mut base.git.api_host,
        &override_config.git.api_host,
        &defaults.git.api_host,
        "provider.git.api_host",
        false,
        changes,
    );
    merge_string(
        &mut base.git.api_context_root,
        &override_config.git.api_context_root,
        &defaults.git.api_context_root,
        "provider.git.api_context_root",
        false,
        changes,
    );
    merge_string(
        &mut base.git.repo_owner,
        &override_config.git.repo_owner,
        &defaults.git.repo_owner,
        "provider.git.repo_owner",
        false,
        changes,
    );
    if override_config.git.repo_name.is_some() && override_config.git.repo_name != base.git.repo_name
    {
        changes.push(format!(
            "provider.git.repo_name = {}",
            override_config.git.repo_name.as_deref().unwrap_or_default()
        ));
        base.git.repo_name.clone_from(&override_config.git.repo_name);
    }
    merge_string(
        &mut base.vault.server_uri,
        &override_config.vault.server_uri,
        &defaults.vault.server_uri,
        "provider.vault.server_uri",
        false,
        changes,
    );
    merge_string(
        &mut base.mongodb.uri,
        &override_config.mongodb.uri,
        &defaults.mongodb.uri,
        "provider.mongodb.uri",
        true,
        changes,
    );
    merge_string(
        &mut base.mongodb.database,
        &override_config.mongodb.database,
        &defaults.mongodb.database,
        "provider.mongodb.database",
        false,
        changes,
    );
    merge_string(
        &mut base.mongodb.collection,
        &override_config.mongodb.collection,
        &defaults.mongodb.collection,
        "provider.mongodb.collection",
        false,
        changes,
    );
    merge_string(
        &mut base.url.service_configs_host,
        &override_config.url.service_configs_host,
        &defaults.url.service_configs_host,
        "provider.url.service_configs_host",
        false,
        changes,
    );
    merge_string(
        &mut base.url.service_configs_dir,
        &override_config.url.service_configs_dir,
        &defaults.url.service_configs_dir,
        "provider.url.service_configs_dir",
        false,
        changes,
    );
}

fn merge_http(base: &mut HttpConfig, override_config: &HttpConfig, changes: &mut Vec<String>) {
    let defaults = HttpConfig::default();

    merge_value(
        &mut base.timeout_seconds,
        override_config.timeout_seconds,
        defaults.timeout_seconds,
        "http.timeout_seconds",
        changes,
    );
    merge_value(
        &mut base.pool_idle_timeout_seconds,
        override_config.pool_idle_timeout_seconds,
        defaults.pool_idle_timeout_seconds,
        "http.pool_idle_timeout_seconds",
        changes,
    );
    merge_value(
        &mut base.proxy.enabled,
        override_config.proxy.enabled,
        defaults.proxy.enabled,
        "http.proxy.enabled",
        changes,
    );
    merge_string(
        &mut base.proxy.scheme,
        &override_config.proxy.scheme,
        &defaults.proxy.scheme,
        "http.proxy.scheme",
        false,
        changes,
    );
    merge_string(
        &mut base.proxy.hostname,
        &override_config.proxy.hostname,
        &defaults.proxy.hostname,
        "http.proxy.hostname",
        false,
        changes,
    );
    merge_value(
        &mut base.proxy.port,
        override_config.proxy.port,
        defaults.proxy.port,
        "http.proxy.port",
        changes,
    );
}

fn merge_server(
    base: &mut ServerConfig,
    override_config: &ServerConfig,
    changes: &mut Vec<String>,
) {
    let defaults = ServerConfig::default();

    merge_string(
        &mut base.host,
        &override_config.host,
        &defaults.host,
        "server.host",
        false,
        changes,
    );
    merge_value(
        &mut base.port,
        override_config.port,
        defaults.port,
        "server.port",
        changes,
    );
}

fn merge_observability(
    base: &mut ObservabilityConfig,
    override_config: &ObservabilityConfig,
    changes: &mut Vec<String>,
) {
    let defaults = ObservabilityConfig::default();

    merge_string(
        &mut base.logging_level,
        &override_config.logging_level,
        &defaults.logging_level,
        "observability.logging_level",
        false,
        changes,
    );
    merge_value(
        &mut base.metrics_enabled,
        override_config.metrics_enabled,
        defaults.metrics_enabled,
        "observability.metrics_enabled",
        changes,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_env_overrides_file() {
        let mut file = Config::default();
        file.server.port = 9000;
        file.provider.vault.server_uri = "http://vault-file:8200".to_string();

        let mut env = Config::default();
        env.server.port = 9100;

        let merged = merge_configs(
            Config::default(),
            file,
            "file",
            env,
            "env",
            CliOverrides::default(),
        );

        assert_eq!(merged.server.port, 9100);
        assert_eq!(merged.provider.vault.server_uri, "http://vault-file:8200");
    }

    #[test]
    fn test_cli_overrides_everything() {
        let mut file = Config::default();
        file.server.port = 9000;
        file.provider.kind = ProviderKind::Git;

        let cli = CliOverrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(8080),
            provider: Some(ProviderKind::Filesystem),
        };

        let merged = merge_configs(
            Config::default(),
            file,
            "file",
            Config::default(),
            "env",
            cli,
        );

        assert_eq!(merged.server.host, "127.0.0.1");
        assert_eq!(merged.server.port, 8080);
        assert_eq!(merged.provider.kind, ProviderKind::Filesystem);
    }

    #[test]
    fn test_default_valued_env_does_not_reset_file() {
        let mut file = Config::default();
        file.http.timeout_seconds = 60;

        let merged = merge_configs(
            Config::default(),
            file,
            "file",
            Config::default(),
            "env",
            CliOverrides::default(),
        );

        assert_eq!(merged.http.timeout_seconds, 60);
    }

    #[test]
    fn test_secret_is_masked_in_changes() {
        let mut override_config = Config::default();
        override_config.provider.mongodb.uri = "mongodb://admin:s3cret@db:27017".to_string();

        let mut changes = Vec::new();
        let mut base = ProviderConfig::default();
        merge_provider(&mut base, &override_config.provider, &mut changes);

        assert_eq!(base.mongodb.uri, "mongodb://admin:s3cret@db:27017");
        assert!(changes.iter().any(|c| c == "provider.mongodb.uri = ****"));
        assert!(!changes.iter().any(|c| c.contains("s3cret")));
    }

    #[test]
    #[serial]
    fn test_load_layered_validates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "provider:\n  kind: git\n").unwrap();

        let result = load_layered(Some(&path), CliOverrides::default());
        assert!(matches!(result, Err(ConfigFileError::Validation(_))));
    }

    #[test]
    #[serial]
    fn test_load_layered_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            "provider:\n  kind: filesystem\n  filesystem:\n    service_configs_dir: /srv/cfg\n",
        )
        .unwrap();

        let layered = load_layered(
            Some(&path),
            CliOverrides {
                port: Some(7000),
                ..CliOverrides::default()
            },
        )
        .unwrap();

        let config = &layered.config;
        assert_eq!(config.provider.kind, ProviderKind::Filesystem);
        assert_eq!(config.provider.filesystem.service_configs_dir, "/srv/cfg");
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    #[serial]
    fn test_load_layered_reports_changes_per_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            "provider:\n  kind: mongodb\n  mongodb:\n    uri: mongodb://admin:s3cret@db:27017\n",
        )
        .unwrap();

        let layered = load_layered(
            Some(&path),
            CliOverrides {
                host: Some("127.0.0.1".to_string()),
                ..CliOverrides::default()
            },
        )
        .unwrap();

        let sources: Vec<&str> = layered.sources.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(sources, vec!["file", "cli"]);

        let file = &layered.sources[0];
        assert!(file.changes.iter().any(|c| c == "provider.kind = mongodb"));
        assert!(file.changes.iter().any(|c| c == "provider.mongodb.uri = ****"));
        assert!(!file.changes.iter().any(|c| c.contains("s3cret")));
        assert_eq!(layered.sources[1].changes, vec!["server.host = 127.0.0.1"]);
    }
}
