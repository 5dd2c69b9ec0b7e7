//! Server setup and lifecycle for the config server.

use config::Config;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{Result, ServerError};
use crate::routes::create_router;
use crate::state::AppState;

/// The config server.
pub struct ConfigServer {
    state: Arc<AppState>,
    config: Config,
}

impl ConfigServer {
    /// Builds the configured provider and, when enabled, the Prometheus
    /// recorder.
    pub async fn new(config: Config) -> Result<Self> {
        let provider = providers::create_provider(&config).await?;
        let mut state = AppState::new(provider);

        if config.observability.metrics_enabled {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| ServerError::Server(format!("Failed to install metrics recorder: {e}")))?;
            state = state.with_metrics(handle);
        }

        Ok(Self::with_state(Arc::new(state), config))
    }

    /// Creates a server instance from an existing `AppState`.
    pub fn with_state(state: Arc<AppState>, config: Config) -> Self {
        Self { state, config }
    }

    /// Runs the HTTP server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| ServerError::Server(format!("Invalid address: {e}")))?;

        let router = create_router(self.state.clone());

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to bind to {addr}: {e}")))?;

        tracing::info!(
            %addr,
            provider = self.state.provider.provider_name(),
            "Config server starting"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {e}")))?;

        tracing::info!("Config server stopped");
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .map_err(|e| ServerError::Server(format!("Failed to install tracing subscriber: {e}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        () = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ProviderKind;

    #[tokio::test]
    async fn test_new_builds_configured_provider() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Filesystem;
        config.observability.metrics_enabled = false;

        let server = ConfigServer::new(config).await.unwrap();
        assert_eq!(server.state().provider.provider_name(), "filesystem");
        assert!(server.state().metrics.is_none());
    }

    #[test]
    fn test_init_tracing_reports_second_install() {
        init_tracing("info").ok();

        let second = init_tracing("debug");
        assert!(matches!(second, Err(ServerError::Server(_))));
    }
}
