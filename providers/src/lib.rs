//! # Config Providers
//!
//! Backend implementations of [`cs_core::ConfigProvider`].
//!
//! # M-CANONICAL-DOCS
//!
//! ## Purpose
//! Reads configuration, certificates and files for a service from one of
//! five backends and normalizes their failures into
//! [`errors::ProviderError`].
//!
//! ## Backends
//! - [`FilesystemProvider`]: local directory tree
//! - [`GitProvider`]: Git hosting contents API, one repository per project
//!   and environment
//! - [`VaultProvider`]: Vault KV v2, userpass login, service discovery
//! - [`MongodbProvider`]: one document per scope (feature `mongodb` for the
//!   live driver)
//! - [`UrlProvider`]: static web server with directory listings
//!
//! ## Usage
//! ```rust,ignore
//! let provider = providers::create_provider(&settings).await?;
//! let token = provider.login(authorization).await?;
//! let result = provider.fetch_configs(token.as_deref(), &coordinate).await?;
//! ```

pub mod factory;
pub mod filesystem;
pub mod git;
pub mod mongodb;
pub mod normalize;
pub mod observability;
pub mod url;
pub mod vault;

pub use factory::{create_provider, http_client};
pub use filesystem::FilesystemProvider;
pub use git::GitProvider;
#[cfg(feature = "mongodb")]
pub use self::mongodb::MongoCollectionStore;
pub use self::mongodb::{
    ConfigDocument, ConfigEntry, DocumentStore, InMemoryDocumentStore, MongodbProvider,
};
pub use observability::InstrumentedProvider;
pub use url::UrlProvider;
pub use vault::{BasicCredentials, VaultProvider};
