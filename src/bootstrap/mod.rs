mod server;
mod shutdown;
mod state;

pub use server::Server;
pub use shutdown::{Shutdown, ShutdownState};
pub use state::{BridgeState, SequenceCounter, SharedBridgeState};
