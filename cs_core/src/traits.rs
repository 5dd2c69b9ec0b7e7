//! Provider contract implemented by every configuration backend.

use crate::resolve::resolve_category;
use crate::types::{Category, ConfigResult, Coordinate, Properties, Scope, ServiceRef};
use async_trait::async_trait;
use errors::ProviderError;

/// Unified trait for all configuration backends.
///
/// A provider implements one primitive, [`fetch_scope`](Self::fetch_scope),
/// which reads a single scope of a single category. The category fetches are
/// provided on top of it and run the two-scope resolution, so the override
/// rule is identical for every backend.
///
/// # Authentication
///
/// [`login`](Self::login) turns the caller's `Authorization` header into the
/// token passed to later calls. What the token is depends on the backend:
/// - Filesystem, MongoDB: ignored, passed through
/// - URL: passed through and sent as `Authorization` when non-blank
/// - Git: must be a bearer credential, sent as `Authorization`
/// - Vault: basic credentials exchanged for a client token
///
/// # Example
///
/// ```rust,ignore
/// let provider = create_provider(&settings).await?;
/// let token = provider.login(headers.authorization()).await?;
/// let result = provider.fetch_configs(token.as_deref(), &coordinate).await?;
/// ```
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Converts the caller's authorization value into a backend token.
    async fn login(&self, authorization: Option<&str>) -> Result<Option<String>, ProviderError>;

    /// Reads one scope of one category.
    ///
    /// Returns `NotFound` when nothing exists at the scope address.
    async fn fetch_scope(
        &self,
        token: Option<&str>,
        coordinate: &Coordinate,
        category: Category,
        scope: Scope,
    ) -> Result<Properties, ProviderError>;

    async fn fetch_category(
        &self,
        token: Option<&str>,
        coordinate: &Coordinate,
        category: Category,
    ) -> Result<ConfigResult, ProviderError> {
        resolve_category(self, token, coordinate, category).await
    }

    async fn fetch_configs(
        &self,
        token: Option<&str>,
        coordinate: &Coordinate,
    ) -> Result<ConfigResult, ProviderError> {
        self.fetch_category(token, coordinate, Category::Configs)
            .await
    }

    async fn fetch_certificates(
        &self,
        token: Option<&str>,
        coordinate: &Coordinate,
    ) -> Result<ConfigResult, ProviderError> {
        self.fetch_category(token, coordinate, Category::Certs).await
    }

    async fn fetch_files(
        &self,
        token: Option<&str>,
        coordinate: &Coordinate,
    ) -> Result<ConfigResult, ProviderError> {
        self.fetch_category(token, coordinate, Category::Files).await
    }

    /// Lists known services. Only backends with discovery return entries.
    async fn search_services(
        &self,
        _token: Option<&str>,
        _project_name: Option<&str>,
    ) -> Result<Vec<ServiceRef>, ProviderError> {
        Ok(Vec::new())
    }

    fn provider_name(&self) -> &'static str;
}
