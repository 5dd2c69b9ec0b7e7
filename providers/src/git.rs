//! Git hosting contents API backend.
//!
//! Each (project, environment) pair lives in its own repository, named from
//! a template. Inside the repository the layout is
//! `<category>/<scope>/<version>/`.

use crate::normalize::{
    PayloadFormat, check_response, decode_mime, encode_blob, parse_properties_bytes,
    transport_error,
};
use async_trait::async_trait;
use config::GitConfig;
use cs_core::address::{config_file_names, join_url, repo_name};
use cs_core::{Category, ConfigProvider, Coordinate, Properties, Scope};
use errors::ProviderError;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, warn};

const BACKEND: &str = "git";
const CONTENTS: &str = "contents";
const ACCEPT_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct FileContent {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    name: String,
    #[serde(rename = "type", default)]
    entry_type: Option<String>,
}

pub struct GitProvider {
    client: Client,
    config: GitConfig,
}

impl GitProvider {
    pub fn new(client: Client, config: GitConfig) -> Self {
        Self { client, config }
    }

    /// `<api_host>/<context_root>/<owner>/<repo>/contents`
    pub fn repository_url(&self, coordinate: &Coordinate) -> String {
        let repo = repo_name(self.config.repo_name.as_deref(), coordinate);
        join_url(
            &self.config.api_host,
            &[
                self.config.api_context_root.as_str(),
                self.config.repo_owner.as_str(),
                repo.as_str(),
                CONTENTS,
            ],
        )
    }

    /// `<repository>/<category>/<scope>/<version>`
    pub fn scope_url(&self, coordinate: &Coordinate, category: Category, scope: Scope) -> String {
        join_url(
            &self.repository_url(coordinate),
            &[
                category.as_str(),
                scope.name(coordinate),
                scope.version(coordinate),
            ],
        )
    }

    async fn get(&self, token: Option<&str>, url: &str) -> Result<reqwest::Response, ProviderError> {
        debug!(url = url, "GET git contents");

        let mut request = self.client.get(url).header(ACCEPT, ACCEPT_JSON);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(BACKEND, e))?;
        check_response(response, BACKEND, url).await
    }

    async fn file_bytes(&self, token: Option<&str>, url: &str) -> Result<Vec<u8>, ProviderError> {
        let body: FileContent = self
            .get(token, url)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(BACKEND, e))?;

        let content = body
            .content
            .ok_or_else(|| ProviderError::parse(url, "response has no content field"))?;
        decode_mime(&content, url)
    }

    async fn fetch_configs_scope(
        &self,
        token: Option<&str>,
        scope_url: &str,
    ) -> Result<Properties, ProviderError> {
        for name in config_file_names() {
            let url = join_url(scope_url, &[name.as_str()]);
            match self.file_bytes(token, &url).await {
                Ok(bytes) => {
                    return parse_properties_bytes(
                        &bytes,
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
        let entries: Vec<DirectoryEntry> = self
            .get(token, scope_url)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(BACKEND, e))?;

        let mut blobs = Properties::new();
        for entry in entries {
            if entry.entry_type.as_deref().is_some_and(|t| t != "file") {
                continue;
            }

            let url = join_url(scope_url, &[entry.name.as_str()]);
            match self.file_bytes(token, &url).await {
                Ok(bytes) => {
                    blobs.insert(entry.name, encode_blob(&bytes));
                }
                Err(ProviderError::NotFound { location }) => {
                    warn!(location = %location, "Listed file disappeared, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(blobs)
    }
}

#[async_trait]
impl ConfigProvider for GitProvider {
    async fn login(&self, authorization: Option<&str>) -> Result<Option<String>, ProviderError> {
        match authorization {
            Some(value) if value.to_lowercase().starts_with("bearer") => {
                Ok(Some(value.to_string()))
            }
            _ => Err(ProviderError::unauthorized(
                "a bearer authorization is required",
            )),
        }
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
        "git"
    }
}
