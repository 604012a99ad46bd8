//! Producer-facing broker channel.

mod service;

pub use service::{BrokerError, BrokerService};
