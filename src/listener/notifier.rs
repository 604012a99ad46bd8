//! Fan-out of accepted broker messages to registered listeners.

use tracing::{debug, warn};

use crate::telemetry::counters;

use super::registry::SharedRegistry;

/// Broadcasts one notification per accepted broker message to every
/// listener in a registry snapshot.
///
/// Delivery attempts are independent: a dead listener is evicted from
/// the registry and logged, and the rest of the round still runs. The
/// call always completes once every snapshot member has been attempted.
#[derive(Clone)]
pub struct Notifier {
    registry: SharedRegistry,
}

impl Notifier {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// Deliver `(message, sequence)` to every currently registered
    /// listener, best-effort.
    pub async fn broadcast(&self, message: &str, sequence: u64) {
        let payload = format!("Messages received: {message}, sequence: {sequence}");
        let snapshot = self.registry.snapshot().await;

        debug!(
            sequence,
            recipients = snapshot.len(),
            "broadcasting notification"
        );

        for listener in snapshot {
            match listener.send(payload.clone()) {
                Ok(()) => counters::notification_queued(),
                Err(_) => {
                    warn!(
                        listener = %listener.id,
                        sequence,
                        "delivery failed, evicting listener"
                    );
                    counters::delivery_failed();
                    self.registry.remove(listener.id).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::ListenerRegistry;
    use std::net::SocketAddr;

    fn test_peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_listeners() {
        let registry = ListenerRegistry::new();
        let notifier = Notifier::new(registry.clone());

        let (_a, mut rx_a) = registry.register(test_peer()).await;
        let (_b, mut rx_b) = registry.register(test_peer()).await;

        notifier.broadcast("ping", 1).await;

        let expected = "Messages received: ping, sequence: 1";
        assert_eq!(rx_a.recv().await.unwrap(), expected);
        assert_eq!(rx_b.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_failed_delivery_evicts_only_dead_listener() {
        let registry = ListenerRegistry::new();
        let notifier = Notifier::new(registry.clone());

        let (dead, rx_dead) = registry.register(test_peer()).await;
        let (live, mut rx_live) = registry.register(test_peer()).await;

        // Dropped receiver simulates a session that died without
        // deregistering yet
        drop(rx_dead);

        notifier.broadcast("a", 1).await;

        // Isolation: the live listener still got the payload
        assert_eq!(
            rx_live.recv().await.unwrap(),
            "Messages received: a, sequence: 1"
        );

        // The dead one was evicted
        assert!(!registry.contains(dead).await);
        assert!(registry.contains(live).await);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_broadcast_with_no_listeners_completes() {
        let registry = ListenerRegistry::new();
        let notifier = Notifier::new(registry.clone());

        notifier.broadcast("solo", 7).await;
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcasts_are_ordered_per_listener() {
        let registry = ListenerRegistry::new();
        let notifier = Notifier::new(registry.clone());

        let (_id, mut rx) = registry.register(test_peer()).await;

        notifier.broadcast("a", 1).await;
        notifier.broadcast("b", 2).await;

        assert_eq!(rx.recv().await.unwrap(), "Messages received: a, sequence: 1");
        assert_eq!(rx.recv().await.unwrap(), "Messages received: b, sequence: 2");
    }
}
