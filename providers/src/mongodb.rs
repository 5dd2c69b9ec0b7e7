//! MongoDB document backend.
//!
//! One document per scope, keyed by `_id` =
//! `<category>/<project>/<scope>/<version>/<env>`:
//!
//! ```json
//! { "_id": "certs/retail/globals/v1/dev",
//!   "configs": [ { "configName": "client.keystore", "content": "..." } ] }
//! ```
//!
//! Document access goes through [`DocumentStore`] so decoding can be tested
//! without a running server.

use crate::normalize::{PayloadFormat, encode_blob, parse_properties};
use async_trait::async_trait;
use cs_core::address::{config_file_names, relative_key};
use cs_core::{Category, ConfigProvider, Coordinate, Properties, Scope};
use errors::ProviderError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// One named payload inside a scope document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    #[serde(rename = "configName")]
    pub config_name: String,
    #[serde(default)]
    pub content: String,
}

impl ConfigEntry {
    pub fn new(config_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            config_name: config_name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub configs: Vec<ConfigEntry>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Entries of the document with the given `_id`, `None` when absent.
    async fn find_entries(&self, id: &str) -> Result<Option<Vec<ConfigEntry>>, ProviderError>;
}

/// Map-backed store for tests and local runs.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Vec<ConfigEntry>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, entries: Vec<ConfigEntry>) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), entries);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_entries(&self, id: &str) -> Result<Option<Vec<ConfigEntry>>, ProviderError> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents.get(id).cloned())
    }
}

#[cfg(feature = "mongodb")]
pub use self::collection::MongoCollectionStore;

#[cfg(feature = "mongodb")]
mod collection {
    use super::{ConfigDocument, ConfigEntry, DocumentStore};
    use async_trait::async_trait;
    use config::MongodbConfig;
    use errors::{ProviderError, SetupError};
    use mongodb::{
        Client, Collection,
        bson::doc,
        error::ErrorKind as DriverErrorKind,
        options::ClientOptions,
    };
    use tracing::info;

    /// Store backed by one MongoDB collection.
    pub struct MongoCollectionStore {
        collection: Collection<ConfigDocument>,
    }

    impl MongoCollectionStore {
        /// Connects and pings once; an unreachable server fails setup.
        pub async fn connect(config: &MongodbConfig) -> Result<Self, SetupError> {
            let connection = |e: mongodb::error::Error| SetupError::Connection {
                backend: "mongodb".to_string(),
                reason: e.to_string(),
            };

            let options = ClientOptions::parse(&config.uri).await.map_err(connection)?;
            let client = Client::with_options(options).map_err(connection)?;
            let database = client.database(&config.database);
            database
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(connection)?;

            info!(
                database = %config.database,
                collection = %config.collection,
                "Connected to MongoDB"
            );

            Ok(Self {
                collection: database.collection(&config.collection),
            })
        }
    }

    #[async_trait]
    impl DocumentStore for MongoCollectionStore {
        async fn find_entries(
            &self,
            id: &str,
        ) -> Result<Option<Vec<ConfigEntry>>, ProviderError> {
            match self.collection.find_one(doc! { "_id": id }).await {
                Ok(document) => Ok(document.map(|d| d.configs)),
                Err(e) => match e.kind.as_ref() {
                    DriverErrorKind::BsonDeserialization(inner) => {
                        Err(ProviderError::parse(id, inner.to_string()))
                    }
                    _ => Err(ProviderError::unavailable("mongodb", e.to_string())),
                },
            }
        }
    }
}

pub struct MongodbProvider {
    store: Arc<dyn DocumentStore>,
}

impl MongodbProvider {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn document_id(coordinate: &Coordinate, category: Category, scope: Scope) -> String {
        relative_key(coordinate, category, scope)
    }
}

/// Picks the values document by extension preference.
fn configs_from_entries(entries: &[ConfigEntry], location: &str) -> Result<Properties, ProviderError> {
    for name in config_file_names() {
        if let Some(entry) = entries.iter().find(|e| e.config_name == name) {
            return parse_properties(&entry.content, PayloadFormat::from_file_name(&name), location);
        }
    }
    Ok(Properties::new())
}

fn blobs_from_entries(entries: Vec<ConfigEntry>) -> Properties {
    entries
        .into_iter()
        .map(|e| {
            let blob = encode_blob(e.content.as_bytes());
            (e.config_name, blob)
        })
        .collect()
}

#[async_trait]
impl ConfigProvider for MongodbProvider {
    async fn login(&self, authorization: Option<&str>) -> Result<Option<String>, ProviderError> {
        Ok(authorization.map(str::to_string))
    }

    async fn fetch_scope(
        &self,
        _token: Option<&str>,
        coordinate: &Coordinate,
        category: Category,
        scope: Scope,
    ) -> Result<Properties, ProviderError> {
        let id = Self::document_id(coordinate, category, scope);
        debug!(id = %id, "Looking up scope document");

        let entries = self
            .store
            .find_entries(&id)
            .await?
            .ok_or_else(|| ProviderError::not_found(&id))?;

        match category {
            Category::Configs => configs_from_entries(&entries, &id),
            Category::Certs | Category::Files => Ok(blobs_from_entries(entries)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mongodb"
    }
}
