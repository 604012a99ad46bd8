//! Registry of live WebSocket listeners.
//!
//! Maps `ListenerId` to the sending half of each session's notification
//! queue. A listener present in the map is assumed deliverable; fan-out
//! iterates over a point-in-time snapshot so concurrent registration and
//! removal never race with iteration.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Unique listener identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sending half of a registered listener, as captured by a snapshot.
#[derive(Clone)]
pub struct ListenerSender {
    /// Listener this handle delivers to
    pub id: ListenerId,
    tx: mpsc::UnboundedSender<String>,
}

impl ListenerSender {
    /// Queue a payload for delivery. `Err` means the session is gone and
    /// the listener should be evicted.
    pub fn send(&self, payload: String) -> Result<(), mpsc::error::SendError<String>> {
        self.tx.send(payload)
    }
}

/// Entry for a registered listener
struct ListenerEntry {
    /// Notification queue into the session task
    tx: mpsc::UnboundedSender<String>,
    /// Peer address (for logging)
    peer: SocketAddr,
}

/// Registry of active listeners
pub struct ListenerRegistry {
    /// Map of listener ID to session handle
    listeners: RwLock<HashMap<ListenerId, ListenerEntry>>,

    /// Listener ID generator
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Create a new listener registry
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Register a listener and get the receiving end of its
    /// notification queue
    pub async fn register(&self, peer: SocketAddr) -> (ListenerId, mpsc::UnboundedReceiver<String>) {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::unbounded_channel();

        let mut listeners = self.listeners.write().await;
        listeners.insert(id, ListenerEntry { tx, peer });

        debug!(listener = %id, %peer, "listener registered");
        (id, rx)
    }

    /// Remove a listener. Silent no-op when absent: a disconnect and a
    /// failed delivery may both remove the same listener.
    pub async fn remove(&self, id: ListenerId) {
        let mut listeners = self.listeners.write().await;
        if let Some(entry) = listeners.remove(&id) {
            debug!(listener = %id, peer = %entry.peer, "listener removed");
        }
    }

    /// Point-in-time copy of the sending halves.
    ///
    /// The copy is stale on return: listeners added afterwards miss this
    /// round, listeners removed afterwards may still get one failed
    /// delivery attempt, which triggers their own (idempotent) removal.
    pub async fn snapshot(&self) -> Vec<ListenerSender> {
        let listeners = self.listeners.read().await;
        listeners
            .iter()
            .map(|(id, entry)| ListenerSender {
                id: *id,
                tx: entry.tx.clone(),
            })
            .collect()
    }

    /// Get the number of registered listeners
    pub async fn count(&self) -> usize {
        self.listeners.read().await.len()
    }

    /// Check if a listener is registered
    pub async fn contains(&self, id: ListenerId) -> bool {
        self.listeners.read().await.contains_key(&id)
    }
}

/// Shared listener registry handle
pub type SharedRegistry = Arc<ListenerRegistry>;

#[cfg(test)]
mod tests {
    use super::*;

    fn test_peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_register_remove() {
        let registry = ListenerRegistry::new();

        let (id, _rx) = registry.register(test_peer()).await;
        assert!(registry.contains(id).await);
        assert_eq!(registry.count().await, 1);

        registry.remove(id).await;
        assert!(!registry.contains(id).await);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_double_remove_is_noop() {
        let registry = ListenerRegistry::new();

        let (a, _rx_a) = registry.register(test_peer()).await;
        let (b, _rx_b) = registry.register(test_peer()).await;

        registry.remove(a).await;
        registry.remove(a).await;

        assert!(!registry.contains(a).await);
        assert!(registry.contains(b).await);
    }

    #[tokio::test]
    async fn test_snapshot_is_point_in_time() {
        let registry = ListenerRegistry::new();

        let (a, _rx_a) = registry.register(test_peer()).await;
        let snapshot = registry.snapshot().await;

        // Added after the snapshot: not part of this round
        let (_b, _rx_b) = registry.register(test_peer()).await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, a);
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn test_snapshot_delivers_to_queue() {
        let registry = ListenerRegistry::new();
        let (_id, mut rx) = registry.register(test_peer()).await;

        let snapshot = registry.snapshot().await;
        snapshot[0].send("hello".to_string()).unwrap();

        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_send_fails_after_receiver_dropped() {
        let registry = ListenerRegistry::new();
        let (_id, rx) = registry.register(test_peer()).await;

        let snapshot = registry.snapshot().await;
        drop(rx);

        assert!(snapshot[0].send("hello".to_string()).is_err());
    }
}
