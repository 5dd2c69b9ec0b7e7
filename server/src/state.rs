//! Application state for the config server.

use cs_core::ConfigProvider;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Active provider, chosen once at start.
    pub provider: Arc<dyn ConfigProvider>,
    /// Prometheus render handle, when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(provider: Arc<dyn ConfigProvider>) -> Self {
        Self {
            provider,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
