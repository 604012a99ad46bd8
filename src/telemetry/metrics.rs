//! Prometheus metrics wiring and counter helpers.

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Call once at process start; the returned handle renders the scrape
/// body for `GET /metrics`.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {e}"))?;

    info!("metrics recorder installed");
    Ok(handle)
}

/// Named counter helpers so call sites stay one-liners.
pub mod counters {
    pub fn broker_message_received() {
        metrics::counter!("relayd_broker_messages_total").increment(1);
    }

    pub fn broker_reply_sent() {
        metrics::counter!("relayd_broker_replies_total").increment(1);
    }

    pub fn broker_accept_error() {
        metrics::counter!("relayd_broker_accept_errors_total").increment(1);
    }

    pub fn listener_connected() {
        metrics::counter!("relayd_listener_connections_total").increment(1);
        metrics::gauge!("relayd_listener_connections_active").increment(1.0);
    }

    pub fn listener_disconnected() {
        metrics::gauge!("relayd_listener_connections_active").decrement(1.0);
    }

    pub fn notification_queued() {
        metrics::counter!("relayd_notifications_total").increment(1);
    }

    pub fn delivery_failed() {
        metrics::counter!("relayd_delivery_failures_total").increment(1);
    }
}
