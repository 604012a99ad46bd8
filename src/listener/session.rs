//! Per-connection WebSocket session.
//!
//! A session performs no application-level reads of its own: it pumps
//! queued notifications to the socket and watches the client side for
//! close or transport error. Deregistration runs on every exit path out
//! of the pump loop, not only the clean-close one.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::bootstrap::Shutdown;
use crate::telemetry::counters;

use super::registry::SharedRegistry;

/// Drive one listener connection from accept to deregistration.
pub async fn run_session(
    socket: WebSocket,
    peer: SocketAddr,
    registry: SharedRegistry,
    shutdown: Arc<Shutdown>,
) {
    if !shutdown.connection_opened() {
        debug!(%peer, "rejecting listener while draining");
        // Dropping the socket closes the connection
        return;
    }

    let (id, mut notifications) = registry.register(peer).await;
    counters::listener_connected();

    let (mut sink, mut stream) = socket.split();
    let mut shutdown_rx = shutdown.subscribe();

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                debug!(listener = %id, "session closing on shutdown");
                break;
            }

            payload = notifications.recv() => {
                match payload {
                    // Queue sender gone: we were evicted from the registry
                    None => break,
                    Some(text) => {
                        if let Err(e) = sink.send(Message::Text(text.into())).await {
                            warn!(listener = %id, error = %e, "push failed, closing session");
                            break;
                        }
                    }
                }
            }

            incoming = stream.next() => {
                match incoming {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => {
                        debug!(listener = %id, "listener disconnected");
                        break;
                    }
                    // Listeners send nothing meaningful after the handshake
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Unconditional cleanup: clean close, transport error, failed push
    // and shutdown all land here.
    registry.remove(id).await;
    shutdown.connection_closed();
    counters::listener_disconnected();

    debug!(listener = %id, %peer, "session ended");
}
