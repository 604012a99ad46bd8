//! WebSocket listener management.
//!
//! Listeners subscribe at `/ws` and only ever receive pushed
//! notifications. Presence in the registry is the liveness signal:
//! there is no separate health check, eviction on delivery failure and
//! session cleanup are the only membership changes.

mod notifier;
mod registry;
mod session;

pub use notifier::Notifier;
pub use registry::{ListenerId, ListenerRegistry, ListenerSender, SharedRegistry};
pub use session::run_session;
