//! HashiCorp Vault KV v2 backend.
//!
//! Each category is its own KV mount (`configs`, `certs`, `files`). A scope
//! is one secret at `<project>/<scope>/<version>/<env>`; its `data.data`
//! object is returned as-is.
//!
//! Vault is the only backend with service discovery: the `configs` mount's
//! metadata listing enumerates projects and their services.

use crate::normalize::{check_response, transport_error};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cs_core::address::join_url;
use cs_core::{Category, ConfigProvider, Coordinate, Properties, Scope, ServiceRef};
use errors::ProviderError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

const BACKEND: &str = "vault";
const TOKEN_HEADER: &str = "X-Vault-Token";
const LOGIN_PATH: &str = "v1/auth/userpass/login";
const METADATA_PATH: &str = "v1/configs/metadata";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: Option<String>,
}

/// Username and password from a `Basic` authorization value.
#[derive(Debug, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Parses `Basic <base64(username:password)>`.
    ///
    /// Any deviation (missing value, other scheme, bad base64, non-UTF-8,
    /// no `:` separator) is `Unauthorized`.
    pub fn parse(authorization: Option<&str>) -> Result<Self, ProviderError> {
        let value = authorization
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ProviderError::unauthorized("missing authorization"))?;

        let (scheme, encoded) = value
            .split_once(char::is_whitespace)
            .ok_or_else(|| ProviderError::unauthorized("malformed authorization"))?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(ProviderError::unauthorized(
                "basic authorization is required",
            ));
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| ProviderError::unauthorized("credentials are not valid base64"))?;
        let credentials = String::from_utf8(decoded)
            .map_err(|_| ProviderError::unauthorized("credentials are not valid UTF-8"))?;
        let (username, password) = credentials
            .split_once(':')
            .ok_or_else(|| ProviderError::unauthorized("credentials must be username:password"))?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

pub struct VaultProvider {
    client: Client,
    server_uri: String,
}

impl VaultProvider {
    pub fn new(client: Client, server_uri: impl Into<String>) -> Self {
        Self {
            client,
            server_uri: server_uri.into(),
        }
    }

    /// `<uri>/v1/<category>/data/<project>/<scope>/<version>/<env>`
    pub fn secret_url(&self, coordinate: &Coordinate, category: Category, scope: Scope) -> String {
        join_url(
            &self.server_uri,
            &[
                "v1",
                category.as_str(),
                "data",
                coordinate.project_name.as_str(),
                scope.name(coordinate),
                scope.version(coordinate),
                coordinate.environment.as_str(),
            ],
        )
    }

    /// Metadata listing URL; an empty path lists the mount root.
    pub fn metadata_url(&self, path: &str) -> String {
        let base = join_url(&self.server_uri, &[METADATA_PATH]);
        if path.trim_matches('/').is_empty() {
            format!("{}/", base)
        } else {
            join_url(&base, &[path])
        }
    }

    fn require_token(token: Option<&str>) -> Result<&str, ProviderError> {
        token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ProviderError::unauthorized("a Vault token is required"))
    }

    async fn get_json(&self, token: &str, url: &str) -> Result<Value, ProviderError> {
        debug!(url = url, "GET vault");

        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| transport_error(BACKEND, e))?;
        check_response(response, BACKEND, url)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(BACKEND, e))
    }

    /// Keys under a metadata path. A missing path lists nothing.
    async fn list_keys(&self, token: &str, path: &str) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}?list=true", self.metadata_url(path));
        let body = match self.get_json(token, &url).await {
            Ok(body) => body,
            Err(ProviderError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let keys = body
            .get("data")
            .and_then(|d| d.get("keys"))
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::parse(&url, "listing has no data.keys array"))?;

        Ok(keys
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl ConfigProvider for VaultProvider {
    async fn login(&self, authorization: Option<&str>) -> Result<Option<String>, ProviderError> {
        let credentials = BasicCredentials::parse(authorization)?;
        debug!(username = %credentials.username, password = "****", "Vault login");

        let url = join_url(&self.server_uri, &[LOGIN_PATH, credentials.username.as_str()]);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "password": credentials.password }))
            .send()
            .await
            .map_err(|e| transport_error(BACKEND, e))?;

        let status = response.status();
        if !status.is_success() {
            info!(status = status.as_u16(), "Vault login rejected");
            return Err(ProviderError::unauthorized(format!(
                "Vault login failed with status {}",
                status.as_u16()
            )));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| transport_error(BACKEND, e))?;
        let token = body
            .auth
            .and_then(|auth| auth.client_token)
            .ok_or_else(|| ProviderError::parse(&url, "response has no auth.client_token"))?;

        Ok(Some(token))
    }

    async fn fetch_scope(
        &self,
        token: Option<&str>,
        coordinate: &Coordinate,
        category: Category,
        scope: Scope,
    ) -> Result<Properties, ProviderError> {
        let token = Self::require_token(token)?;
        let url = self.secret_url(coordinate, category, scope);
        let body = self.get_json(token, &url).await?;

        match body.get("data").and_then(|d| d.get("data")) {
            Some(Value::Object(data)) => Ok(data.clone().into_iter().collect()),
            Some(Value::Null) | None => Ok(Properties::new()),
            Some(_) => Err(ProviderError::parse(&url, "data.data is not an object")),
        }
    }

    async fn search_services(
        &self,
        token: Option<&str>,
        project_name: Option<&str>,
    ) -> Result<Vec<ServiceRef>, ProviderError> {
        let token = Self::require_token(token)?;

        if let Some(project) = project_name {
            let keys = self.list_keys(token, project).await?;
            return Ok(keys
                .iter()
                .map(|key| ServiceRef::new(project, Some(trim_key(key).to_string())))
                .collect());
        }

        let mut services = Vec::new();
        for key in self.list_keys(token, "").await? {
            if key.ends_with('/') {
                let project = trim_key(&key);
                for service in self.list_keys(token, project).await? {
                    services.push(ServiceRef::new(
                        project,
                        Some(trim_key(&service).to_string()),
                    ));
                }
            } else {
                services.push(ServiceRef::new(key, None));
            }
        }

        info!(count = services.len(), "Discovered services");
        Ok(services)
    }

    fn provider_name(&self) -> &'static str {
        "vault"
    }
}

fn trim_key(key: &str) -> &str {
    key.trim_end_matches('/')
}
