//! Local directory tree backend.
//!
//! Layout: `<root>/<category>/<project>/<scope>/<version>/<env>/`, holding a
//! `values.{yml,yaml,json}` file for configs and plain files for certs and
//! files.

use crate::normalize::{PayloadFormat, encode_blob, io_error, parse_properties_bytes};
use async_trait::async_trait;
use cs_core::address::{config_file_names, segments};
use cs_core::{Category, ConfigProvider, Coordinate, Properties, Scope};
use errors::ProviderError;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FilesystemProvider {
    root: PathBuf,
}

impl FilesystemProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one scope of one category.
    pub fn scope_dir(&self, coordinate: &Coordinate, category: Category, scope: Scope) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in segments(coordinate, category, scope) {
            dir.push(segment);
        }
        dir
    }

    async fn read_configs(&self, dir: &Path) -> Result<Properties, ProviderError> {
        for name in config_file_names() {
            let path = dir.join(&name);
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    debug!(path = %path.display(), "Loaded configs file");
                    return parse_properties_bytes(
                        &bytes,
                        PayloadFormat::from_file_name(&name),
                        &path.display().to_string(),
                    );
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(&path, &e)),
            }
        }
        Err(ProviderError::not_found(dir.display().to_string()))
    }

    async fn read_blobs(&self, dir: &Path) -> Result<Properties, ProviderError> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| io_error(dir, &e))?;

        let mut blobs = Properties::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(dir, &e))? {
            let path = entry.path();
            // Follows symlinks: mounted secrets are links into a data dir.
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Skipping dangling link");
                    continue;
                }
                Err(e) => return Err(io_error(&path, &e)),
            };
            if !metadata.is_file() {
                continue;
            }

            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| io_error(&path, &e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            blobs.insert(name, encode_blob(&bytes));
        }

        debug!(dir = %dir.display(), count = blobs.len(), "Loaded files");
        Ok(blobs)
    }
}

#[async_trait]
impl ConfigProvider for FilesystemProvider {
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
        coordinate.ensure_addressable()?;
        let dir = self.scope_dir(coordinate, category, scope);
        debug!(dir = %dir.display(), scope = %scope, "Reading scope");

        match category {
            Category::Configs => self.read_configs(&dir).await,
            Category::Certs | Category::Files => self.read_blobs(&dir).await,
        }
    }

    fn provider_name(&self) -> &'static str {
        "filesystem"
    }
}
