//! API handlers.

use std::net::SocketAddr;

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::listener;

use super::server::ApiState;

/// Greeting response for the root endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    #[serde(rename = "Hello")]
    pub hello: String,
}

/// Root handler.
pub async fn root_handler() -> impl IntoResponse {
    Json(RootResponse {
        hello: "World".to_string(),
    })
}

/// Count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Current broker message count.
pub async fn count_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(CountResponse {
        count: state.bridge.counter.get(),
    })
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub listeners: usize,
}

/// Health handler.
pub async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.bridge.uptime().as_secs(),
        listeners: state.bridge.registry.count().await,
    })
}

/// Metrics handler (Prometheus format).
pub async fn metrics_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let body = state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    ([("content-type", "text/plain; charset=utf-8")], body)
}

/// WebSocket subscribe endpoint. The session task owns the connection
/// from the upgrade onwards.
pub async fn ws_handler(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let registry = state.bridge.registry.clone();
    let shutdown = state.shutdown.clone();

    ws.on_upgrade(move |socket| listener::run_session(socket, peer, registry, shutdown))
}
