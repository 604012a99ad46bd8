//! HTTP API server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::info;

use crate::bootstrap::{SharedBridgeState, Shutdown};
use crate::config::ApiConfig;

use super::handlers::{
    count_handler, health_handler, metrics_handler, root_handler, ws_handler,
};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    /// Counter and listener registry
    pub bridge: SharedBridgeState,
    /// Shutdown handle (sessions subscribe to it)
    pub shutdown: Arc<Shutdown>,
    /// Prometheus scrape handle (None when no recorder is installed)
    pub metrics: Option<PrometheusHandle>,
}

/// HTTP API server.
pub struct ApiServer {
    config: ApiConfig,
    state: ApiState,
    shutdown: Arc<Shutdown>,
}

impl ApiServer {
    /// Create a new API server.
    pub fn new(
        config: &ApiConfig,
        bridge: SharedBridgeState,
        shutdown: Arc<Shutdown>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config: config.clone(),
            state: ApiState {
                bridge,
                shutdown: shutdown.clone(),
                metrics,
            },
            shutdown,
        }
    }

    /// Build the router.
    fn build_router(&self) -> Router {
        Router::new()
            // Status endpoints
            .route("/", get(root_handler))
            .route("/count", get(count_handler))
            // Listener subscribe endpoint
            .route("/ws", get(ws_handler))
            // Health and metrics
            .route("/healthz", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.state.clone())
    }

    /// Run the API server.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.build_router();
        let addr = self.config.address;

        info!(address = %addr, "starting api server");

        let listener = TcpListener::bind(addr).await?;
        let mut shutdown_rx = self.shutdown.subscribe();

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            info!("api server shutting down");
        })
        .await?;

        Ok(())
    }
}
