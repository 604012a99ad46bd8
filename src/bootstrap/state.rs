//! Shared bridge state.
//!
//! The sequence counter and the listener registry are the only shared
//! mutable resources in the process. Both live here behind their own
//! synchronization so callers never touch raw shared state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::listener::{ListenerRegistry, SharedRegistry};

/// Monotonic counter of accepted broker messages.
///
/// Incremented exactly once per accepted message by the broker loop;
/// the `/count` endpoint reads it. Atomic so a status read never
/// observes a torn value.
#[derive(Debug, Default)]
pub struct SequenceCounter(AtomicU64);

impl SequenceCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Advance the counter and return the new value.
    pub fn increment_and_get(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// State shared between the broker loop and the HTTP API.
pub struct BridgeState {
    /// Messages accepted on the broker channel
    pub counter: SequenceCounter,

    /// Live WebSocket listeners
    pub registry: SharedRegistry,

    /// Process start time
    started_at: Instant,
}

impl BridgeState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            counter: SequenceCounter::new(),
            registry: ListenerRegistry::new(),
            started_at: Instant::now(),
        })
    }

    /// Time since the bridge came up.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Shared bridge state handle.
pub type SharedBridgeState = Arc<BridgeState>;
