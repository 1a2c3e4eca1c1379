//! Sensor Simulator Shared Protocol Types
//!
//! This crate provides the hub wire messages and frame codec used between
//! the simulated device fleet and the development hub.

pub mod codec;
pub mod message;

use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at crate root
pub use message::{HubRequest, HubResponse, RequestKind};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Status codes carried in every hub response
pub mod status {
    pub const OK: u16 = 200;

    /// Nothing to return (empty receive, accepted event, completed message)
    pub const NO_CONTENT: u16 = 204;

    pub const BAD_REQUEST: u16 = 400;

    /// Request sent before the link was opened
    pub const UNAUTHORIZED: u16 = 401;

    /// Complete with a lock token the hub does not know
    pub const PRECONDITION_FAILED: u16 = 412;

    /// Canonical reason phrase for a status code
    pub fn reason(code: u16) -> &'static str {
        match code {
            OK => "OK",
            NO_CONTENT => "No Content",
            BAD_REQUEST => "Bad Request",
            UNAUTHORIZED => "Unauthorized",
            PRECONDITION_FAILED => "Precondition Failed",
            _ => "Unknown",
        }
    }
}

/// Builder helpers for creating messages
impl HubRequest {
    /// Create a request of the given kind for a device
    pub fn new(device_id: impl Into<String>, kind: RequestKind, sequence_id: u64) -> Self {
        Self {
            device_id: device_id.into(),
            sequence_id,
            timestamp_ms: now_ms(),
            kind: kind.into(),
            payload: Vec::new(),
            lock_token: String::new(),
            shared_access_key: String::new(),
        }
    }

    /// Attach a message body
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Attach the lock token of a previously received message
    pub fn with_lock_token(mut self, lock_token: impl Into<String>) -> Self {
        self.lock_token = lock_token.into();
        self
    }

    /// Decoded request kind, `Unknown` for values this build does not know
    pub fn request_kind(&self) -> RequestKind {
        RequestKind::try_from(self.kind).unwrap_or(RequestKind::Unknown)
    }
}

impl HubResponse {
    /// Create a bare response answering the given request
    pub fn status(sequence_id: u64, status_code: u16) -> Self {
        Self {
            sequence_id,
            status_code: status_code as u32,
            status_message: status::reason(status_code).to_string(),
            payload: Vec::new(),
            lock_token: String::new(),
        }
    }

    /// Create a 200 response delivering a device-bound message
    pub fn delivery(
        sequence_id: u64,
        payload: impl Into<Vec<u8>>,
        lock_token: impl Into<String>,
    ) -> Self {
        Self {
            payload: payload.into(),
            lock_token: lock_token.into(),
            ..Self::status(sequence_id, status::OK)
        }
    }

    /// Status code narrowed to the HTTP-style range
    pub fn code(&self) -> u16 {
        u16::try_from(self.status_code).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_creation() {
        let req =
            HubRequest::new("MyDevice01", RequestKind::SendEvent, 1).with_payload(b"{}".to_vec());
        assert_eq!(req.device_id, "MyDevice01");
        assert_eq!(req.sequence_id, 1);
        assert_eq!(req.request_kind(), RequestKind::SendEvent);
        assert_eq!(req.payload, b"{}");
        assert!(req.timestamp_ms > 0);
    }

    #[test]
    fn test_unknown_request_kind() {
        let mut req = HubRequest::new("MyDevice01", RequestKind::Receive, 1);
        req.kind = 99;
        assert_eq!(req.request_kind(), RequestKind::Unknown);
    }

    #[test]
    fn test_delivery_response() {
        let resp = HubResponse::delivery(7, b"hello".to_vec(), "lock-1");
        assert_eq!(resp.code(), status::OK);
        assert_eq!(resp.status_message, "OK");
        assert_eq!(resp.lock_token, "lock-1");
    }

    #[test]
    fn test_status_reason() {
        assert_eq!(status::reason(status::NO_CONTENT), "No Content");
        assert_eq!(status::reason(599), "Unknown");
    }
}
