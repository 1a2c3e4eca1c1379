//! Message hub client
//!
//! This module handles:
//! - Device connection string parsing
//! - Sink/source traits the publisher talks to
//! - A TCP hub client with lazy connect and reconnect-on-failure

mod connection_string;
mod tcp;
mod traits;

pub use connection_string::{ConnectionString, ConnectionStringError};
pub use tcp::HubClient;
pub use traits::{InboundMessage, MessageSink, MessageSource, Received, StatusInfo};

use sensorsim_shared::codec::CodecError;
use thiserror::Error;

/// Failures of a single hub operation
#[derive(Error, Debug)]
pub enum HubError {
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(#[from] ConnectionStringError),

    #[error("connect to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("hub closed the connection")]
    Closed,

    #[error("hub refused the link: {0} {1}")]
    Refused(u16, String),

    #[error("response for sequence {actual} while waiting for {expected}")]
    SequenceMismatch { expected: u64, actual: u64 },
}
