//! HTTP request handlers for the config server.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use cs_core::{Category, ConfigResult, Coordinate, ServiceRef};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Query parameters identifying the requested configuration.
#[derive(Debug, Default, Deserialize)]
pub struct CoordinateQuery {
    pub project_name: Option<String>,
    pub project_version: Option<String>,
    pub service_name: Option<String>,
    pub service_version: Option<String>,
    pub environment: Option<String>,
}

impl CoordinateQuery {
    /// Builds a validated coordinate; every parameter is required.
    pub fn into_coordinate(self) -> Result<Coordinate> {
        let coordinate = Coordinate::new(
            required("project_name", self.project_name)?,
            required("project_version", self.project_version)?,
            required("service_name", self.service_name)?,
            required("service_version", self.service_version)?,
            required("environment", self.environment)?,
        );
        coordinate
            .validate()
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;
        Ok(coordinate)
    }
}

fn required(name: &str, value: Option<String>) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest(format!("{} is required", name)))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub project_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

async fn fetch(
    state: &AppState,
    headers: &HeaderMap,
    query: CoordinateQuery,
    category: Category,
) -> Result<Json<ConfigResult>> {
    let coordinate = query.into_coordinate()?;
    tracing::debug!(coordinate = %coordinate, category = %category, "Fetching");

    let provider = &state.provider;
    let token = provider.login(authorization(headers)).await?;
    let token = token.as_deref();

    let result = match category {
        Category::Configs => provider.fetch_configs(token, &coordinate).await?,
        Category::Certs => provider.fetch_certificates(token, &coordinate).await?,
        Category::Files => provider.fetch_files(token, &coordinate).await?,
    };

    tracing::info!(
        coordinate = %coordinate,
        category = %category,
        count = result.config_properties.len(),
        "Returning properties"
    );
    Ok(Json(result))
}

/// GET /config-server/configs
pub async fn get_configs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<ConfigResult>> {
    fetch(&state, &headers, query, Category::Configs).await
}

/// GET /config-server/certs
pub async fn get_certs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<ConfigResult>> {
    fetch(&state, &headers, query, Category::Certs).await
}

/// GET /config-server/files
pub async fn get_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<ConfigResult>> {
    fetch(&state, &headers, query, Category::Files).await
}

/// GET /config-server/services
///
/// Lists services known to the backend, optionally within one project.
pub async fn search_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ServiceRef>>> {
    let project = query
        .project_name
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let token = state.provider.login(authorization(&headers)).await?;
    let services = state
        .provider
        .search_services(token.as_deref(), project)
        .await?;

    tracing::info!(count = services.len(), project = ?project, "Returning services");
    Ok(Json(services))
}

/// Liveness plus the active provider name.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        provider: state.provider.provider_name().to_string(),
    })
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics are disabled\n".to_string()),
    }
}
