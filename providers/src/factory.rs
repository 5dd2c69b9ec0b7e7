use crate::filesystem::FilesystemProvider;
use crate::git::GitProvider;
use crate::observability::InstrumentedProvider;
use crate::url::UrlProvider;
use crate::vault::VaultProvider;
use config::{Config, HttpConfig, ProviderKind};
use cs_core::ConfigProvider;
use errors::SetupError;
use reqwest::{Client, Proxy};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builds the shared outbound HTTP client.
///
/// One client per process: the request timeout and idle pool lifetime
/// apply to every network provider.
pub fn http_client(config: &HttpConfig) -> Result<Client, SetupError> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_seconds));

    if let Some(proxy_url) = config.proxy.url() {
        let proxy = Proxy::all(&proxy_url)
            .map_err(|e| SetupError::configuration(format!("invalid proxy {}: {}", proxy_url, e)))?;
        info!(proxy = %proxy_url, "Routing backend traffic through proxy");
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| SetupError::configuration(format!("HTTP client: {}", e)))
}

/// Creates the configured provider, wrapped with metrics.
pub async fn create_provider(config: &Config) -> Result<Arc<dyn ConfigProvider>, SetupError> {
    let settings = &config.provider;
    info!(provider = %settings.kind, "Creating config provider");

    match settings.kind {
        ProviderKind::Filesystem => Ok(Arc::new(InstrumentedProvider::new(
            FilesystemProvider::new(&settings.filesystem.service_configs_dir),
        ))),
        ProviderKind::Git => {
            let client = http_client(&config.http)?;
            Ok(Arc::new(InstrumentedProvider::new(GitProvider::new(
                client,
                settings.git.clone(),
            ))))
        }
        ProviderKind::Vault => {
            let client = http_client(&config.http)?;
            Ok(Arc::new(InstrumentedProvider::new(VaultProvider::new(
                client,
                settings.vault.server_uri.clone(),
            ))))
        }
        ProviderKind::Url => {
            let client = http_client(&config.http)?;
            let provider = UrlProvider::new(
                client,
                settings.url.service_configs_host.clone(),
                settings.url.service_configs_dir.clone(),
            )?;
            Ok(Arc::new(InstrumentedProvider::new(provider)))
        }
        ProviderKind::Mongodb => {
            #[cfg(feature = "mongodb")]
            {
                let store = crate::mongodb::MongoCollectionStore::connect(&settings.mongodb).await?;
                Ok(Arc::new(InstrumentedProvider::new(
                    crate::mongodb::MongodbProvider::new(Arc::new(store)),
                )))
            }
            #[cfg(not(feature = "mongodb"))]
            {
                Err(SetupError::NotEnabled {
                    provider: "mongodb".to_string(),
                    reason: "compile with --features mongodb".to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ProxyConfig;

    #[test]
    fn test_http_client_with_defaults() {
        assert!(http_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_http_client_with_proxy() {
        let config = HttpConfig {
            proxy: ProxyConfig {
                enabled: true,
                scheme: "http".to_string(),
                hostname: "proxy.internal".to_string(),
                port: 3128,
            },
            ..HttpConfig::default()
        };
        assert!(http_client(&config).is_ok());
    }

    #[tokio::test]
    async fn test_create_each_http_provider() {
        let mut config = Config::default();

        config.provider.kind = ProviderKind::Vault;
        assert_eq!(create_provider(&config).await.unwrap().provider_name(), "vault");

        config.provider.kind = ProviderKind::Filesystem;
        assert_eq!(
            create_provider(&config).await.unwrap().provider_name(),
            "filesystem"
        );

        config.provider.kind = ProviderKind::Git;
        config.provider.git.repo_owner = "networknt".to_string();
        assert_eq!(create_provider(&config).await.unwrap().provider_name(), "git");

        config.provider.kind = ProviderKind::Url;
        config.provider.url.service_configs_host = "http://cfg.local".to_string();
        assert_eq!(create_provider(&config).await.unwrap().provider_name(), "url");
    }
}
