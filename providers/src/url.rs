//! Remote HTTP directory backend.
//!
//! Serves the filesystem layout from a static web server with directory
//! listings enabled: `<host><dir>/<category>/<project>/<scope>/<version>/<env>/`.

use crate::normalize::{
    PayloadFormat, check_response, encode_blob, parse_properties_bytes, transport_error,
};
use async_trait::async_trait;
use cs_core::address::{config_file_names, join_url, segments};
use cs_core::{Category, ConfigProvider, Coordinate, Properties, Scope};
use errors::{ProviderError, SetupError};
use regex::Regex;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, info, warn};

const BACKEND: &str = "url";

/// Anchor text of a directory listing entry, subdirectories excluded.
const LISTING_ANCHOR: &str = r">([^>/]+)</a>";

pub struct UrlProvider {
    client: Client,
    host: String,
    dir: String,
    anchor: Regex,
}

impl UrlProvider {
    pub fn new(
        client: Client,
        host: impl Into<String>,
        dir: impl Into<String>,
    ) -> Result<Self, SetupError> {
        let anchor = Regex::new(LISTING_ANCHOR)
            .map_err(|e| SetupError::configuration(format!("listing pattern: {}", e)))?;

        Ok(Self {
            client,
            host: host.into(),
            dir: dir.into(),
            anchor,
        })
    }

    /// `<host><dir>/<category>/<project>/<scope>/<version>/<env>`
    pub fn scope_url(&self, coordinate: &Coordinate, category: Category, scope: Scope) -> String {
        let root = join_url(&self.host, &[self.dir.as_str()]);
        join_url(&root, &segments(coordinate, category, scope))
    }

    /// File names linked from a directory listing page, in page order.
    pub fn listed_files(&self, page: &str) -> Vec<String> {
        self.anchor
            .captures_iter(page)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }

    async fn get_bytes(&self, token: Option<&str>, url: &str) -> Result<Vec<u8>, ProviderError> {
        debug!(url = url, "GET url configs");

        let mut request = self.client.get(url);
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(BACKEND, e))?;
        check_response(response, BACKEND, url)
            .await?
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| transport_error(BACKEND, e))
    }

    async fn fetch_configs_scope(
        &self,
        token: Option<&str>,
        scope_url: &str,
    ) -> Result<Properties, ProviderError> {
        for name in config_file_names() {
            let url = join_url(scope_url, &[name.as_str()]);
            match self.get_bytes(token, &url).await {
                Ok(body) if body.iter().all(u8::is_ascii_whitespace) => continue,
                Ok(body) => {
                    return parse_properties_bytes(
                        &body,
                        PayloadFormat::from_file_name(&name),
                        &url,
                    );
                }
                Err(ProviderError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(ProviderError::not_found(scope_url))
    }

    async fn fetch_directory_scope(
        &self,
        token: Option<&str>,
        scope_url: &str,
    ) -> Result<Properties, ProviderError> {
        let listing_url = format!("{}/", scope_url);
        let page = self.get_bytes(token, &listing_url).await?;
        let page = String::from_utf8_lossy(&page);

        let mut blobs = Properties::new();
        for name in self.listed_files(&page) {
            let url = join_url(scope_url, &[name.as_str()]);
            match self.get_bytes(token, &url).await {
                Ok(body) if body.is_empty() => {
                    debug!(url = %url, "Skipping empty file");
                }
                Ok(body) => {
                    blobs.insert(name, encode_blob(&body));
                }
                Err(ProviderError::NotFound { location }) => {
                    warn!(location = %location, "Listed file disappeared, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        info!(url = %listing_url, count = blobs.len(), "Loaded listed files");
        Ok(blobs)
    }
}

#[async_trait]
impl ConfigProvider for UrlProvider {
    async fn login(&self, authorization: Option<&str>) -> Result<Option<String>, ProviderError> {
        Ok(authorization.map(str::to_string))
    }

    async fn fetch_scope(
        &self,
        token: Option<&str>,
        coordinate: &Coordinate,
        category: Category,
        scope: Scope,
    ) -> Result<Properties, ProviderError> {
        let scope_url = self.scope_url(coordinate, category, scope);

        match category {
            Category::Configs => self.fetch_configs_scope(token, &scope_url).await,
            Category::Certs | Category::Files => {
                self.fetch_directory_scope(token, &scope_url).await
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "url"
    }
}
