//! relayd — message relay daemon.
//!
//! Bridges a TCP request/reply broker channel to a set of live WebSocket
//! listeners: each accepted broker message advances a shared sequence
//! counter, the producer gets the new count back, and the
//! `(message, sequence)` pair is fanned out to every connected listener.

pub mod api;
pub mod bootstrap;
pub mod broker;
pub mod config;
pub mod listener;
pub mod telemetry;
