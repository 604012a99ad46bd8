//! HTTP API: status endpoints and the WebSocket subscribe endpoint.

mod handlers;
mod server;

pub use server::{ApiServer, ApiState};
