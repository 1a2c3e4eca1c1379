//! Sink and source abstractions for pluggable hub backends

use super::HubError;
use async_trait::async_trait;
use bytes::Bytes;
use sensorsim_shared::status;

/// Status reported by the hub for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    pub code: u16,
    pub message: String,
}

impl StatusInfo {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Empty result; never worth reporting
    pub fn is_no_content(&self) -> bool {
        self.code == status::NO_CONTENT
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// A cloud-to-device message awaiting acknowledgement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub payload: Bytes,
    /// Identifies the message to `complete`
    pub lock_token: String,
}

/// Result of one receive poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub status: StatusInfo,
    pub message: Option<InboundMessage>,
}

/// Endpoint accepting outbound telemetry messages
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver one message body
    async fn send(&self, message: Bytes) -> Result<StatusInfo, HubError>;
}

/// Endpoint polled for inbound messages
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Poll once for the next inbound message
    async fn receive(&self) -> Result<Received, HubError>;

    /// Acknowledge a message returned by `receive`
    async fn complete(&self, message: &InboundMessage) -> Result<StatusInfo, HubError>;
}
