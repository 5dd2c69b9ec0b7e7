//! Route definitions for the config server.

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the Axum router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/configs", get(handlers::get_configs))
        .route("/certs", get(handlers::get_certs))
        .route("/files", get(handlers::get_files))
        .route("/services", get(handlers::search_services));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .nest("/config-server", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
