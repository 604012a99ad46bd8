use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, span, warn, Instrument, Level};

use crate::api::ApiServer;
use crate::broker::BrokerService;
use crate::config::Config;
use crate::listener::Notifier;

use super::shutdown::{Shutdown, ShutdownState};
use super::state::BridgeState;

/// Main relayd server
///
/// Components:
/// - Broker loop task: request/reply ingest, counter, fan-out trigger
/// - API server task: `/`, `/count`, `/ws`, health and metrics endpoints
/// - Shutdown: graceful drain with configurable timeout
pub struct Server {
    /// Configuration
    config: Arc<Config>,

    /// Shutdown coordinator
    shutdown: Arc<Shutdown>,

    /// Prometheus scrape handle (None when no recorder is installed)
    metrics: Option<PrometheusHandle>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config, metrics: Option<PrometheusHandle>) -> Self {
        let shutdown = Shutdown::new(config.settings.shutdown.drain_timeout);

        Self {
            config: Arc::new(config),
            shutdown,
            metrics,
        }
    }

    /// Run the server until shutdown or a fatal broker error
    pub async fn run(self) -> Result<()> {
        let span = span!(Level::INFO, "relayd", version = env!("CARGO_PKG_VERSION"));
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> Result<()> {
        let state = BridgeState::new();
        let notifier = Notifier::new(state.registry.clone());

        // Spawn API server task
        let api = ApiServer::new(
            &self.config.api,
            state.clone(),
            self.shutdown.clone(),
            self.metrics.clone(),
        );
        let api_handle = tokio::spawn(async move {
            if let Err(e) = api.run().await {
                error!(error = %e, "api server failed");
            }
        });

        // Spawn broker loop task
        let broker = BrokerService::new(
            &self.config.broker,
            state.clone(),
            notifier,
            self.shutdown.clone(),
        );
        let mut broker_handle = tokio::spawn(broker.run());

        info!(
            broker = %self.config.broker.address,
            api = %self.config.api.address,
            drain_timeout_secs = self.shutdown.drain_timeout().as_secs(),
            "relayd server started"
        );

        metrics::counter!("relayd_server_starts_total").increment(1);

        // Run until a signal arrives or the broker loop dies. A broker
        // transport failure is fatal: no per-message retry, recovery is
        // a supervisory restart.
        let early_broker_result = tokio::select! {
            _ = Self::wait_for_shutdown() => {
                info!("shutdown signal received, starting graceful shutdown");
                None
            }
            result = &mut broker_handle => {
                error!("broker loop exited unexpectedly");
                Some(result)
            }
        };

        // Start drain period
        self.shutdown.start_drain();

        // Wait for drain or timeout
        let drain_timeout = self.shutdown.drain_timeout();
        let drain_result = tokio::time::timeout(drain_timeout, async {
            let mut rx = self.shutdown.subscribe();
            while *rx.borrow() != ShutdownState::Terminated {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;

        if drain_result.is_err() {
            warn!(
                active_connections = self.shutdown.active_connections(),
                "drain timeout reached, forcing shutdown"
            );
        }

        // Force terminate if not already
        self.shutdown.terminate();

        // Reap the broker loop; it exits on the shutdown watch unless it
        // already died and produced a result above.
        let broker_result = match early_broker_result {
            Some(result) => result,
            None => match tokio::time::timeout(drain_timeout, &mut broker_handle).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("broker loop did not stop in time, aborting");
                    broker_handle.abort();
                    Ok(Ok(()))
                }
            },
        };

        // Stop API server
        api_handle.abort();

        info!("relayd server stopped");

        match broker_result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e).context("broker channel failed"),
            Err(e) => Err(e).context("broker task panicked"),
        }
    }

    /// Wait for shutdown signal (SIGINT or SIGTERM)
    async fn wait_for_shutdown() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("received SIGINT (Ctrl+C)");
            }
            _ = terminate => {
                info!("received SIGTERM");
            }
        }
    }
}
