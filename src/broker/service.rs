//! Request/reply loop for the producer-facing broker channel.
//!
//! One task, strict turn-taking: read a line, advance the counter, reply
//! with the new count, then fan out to listeners. The reply always
//! precedes fan-out so the producer never waits on listener delivery.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use crate::bootstrap::{SharedBridgeState, Shutdown, ShutdownState};
use crate::config::BrokerConfig;
use crate::listener::Notifier;
use crate::telemetry::counters;

/// Broker channel error. Any transport failure is fatal to the loop:
/// there is no per-message retry, recovery is a process-level restart.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("framing error: {0}")]
    Framing(#[from] LinesCodecError),
}

/// The broker request/reply service.
pub struct BrokerService {
    /// Bind address
    address: SocketAddr,

    /// Maximum accepted request line length
    max_line_bytes: usize,

    /// Counter and registry owner
    state: SharedBridgeState,

    /// Fan-out to registered listeners
    notifier: Notifier,

    /// Shutdown handle
    shutdown: Arc<Shutdown>,
}

impl BrokerService {
    /// Create the broker service from config.
    pub fn new(
        config: &BrokerConfig,
        state: SharedBridgeState,
        notifier: Notifier,
        shutdown: Arc<Shutdown>,
    ) -> Self {
        Self {
            address: config.address,
            max_line_bytes: config.max_line_bytes,
            state,
            notifier,
            shutdown,
        }
    }

    /// Run until shutdown or a fatal transport error.
    pub async fn run(self) -> Result<(), BrokerError> {
        let listener = TcpListener::bind(self.address).await?;

        info!(address = %self.address, "broker channel listening");

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    info!("broker loop shutting down");
                    return Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!(%peer, "producer connected");
                            // Producers are served one at a time in this
                            // single task; a second connection waits in the
                            // accept backlog. This keeps the strict
                            // one-outstanding-request contract.
                            self.serve_producer(stream, peer, &mut shutdown_rx).await?;
                        }
                        Err(e) => {
                            warn!(error = %e, "broker accept error");
                            counters::broker_accept_error();
                        }
                    }
                }
            }
        }
    }

    /// Serve one producer connection until it disconnects.
    ///
    /// Each cycle: block on the next line, increment the counter, reply,
    /// then broadcast. Clean EOF returns to the accept loop; a transport
    /// error propagates and kills the broker loop.
    async fn serve_producer(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        shutdown_rx: &mut watch::Receiver<ShutdownState>,
    ) -> Result<(), BrokerError> {
        let codec = LinesCodec::new_with_max_length(self.max_line_bytes);
        let mut framed = Framed::new(stream, codec);

        loop {
            let message = tokio::select! {
                biased;

                _ = shutdown_rx.changed() => return Ok(()),

                frame = framed.next() => match frame {
                    None => {
                        debug!(%peer, "producer disconnected");
                        return Ok(());
                    }
                    Some(frame) => frame?,
                },
            };

            let sequence = self.state.counter.increment_and_get();
            info!(%peer, sequence, "broker message received");
            counters::broker_message_received();

            // Reply before fan-out: the producer must never wait on
            // listener delivery.
            framed.send(format!("Messages received: {sequence}")).await?;
            counters::broker_reply_sent();

            self.notifier.broadcast(&message, sequence).await;
        }
    }
}
