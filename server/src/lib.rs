//! # Config Server
//!
//! HTTP server handing out merged configuration, certificates and files to
//! services at start-up.
//!
//! ## Endpoints
//!
//! - `GET /config-server/configs` - Merged structured configuration
//! - `GET /config-server/certs` - Merged certificates, base64 encoded
//! - `GET /config-server/files` - Merged plain files, base64 encoded
//! - `GET /config-server/services` - Known services (Vault only)
//! - `GET /health` - Health check endpoint
//! - `GET /metrics` - Prometheus metrics endpoint
//!
//! The fetch endpoints take `project_name`, `project_version`,
//! `service_name`, `service_version` and `environment` query parameters and
//! forward the `Authorization` header to the active provider's login.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ServerError;
pub use routes::create_router;
pub use server::ConfigServer;
pub use state::AppState;
