//! Hub wire messages
//!
//! Every device operation is a single `HubRequest` answered by a single
//! `HubResponse` carrying the same `sequence_id`.

use prost::{Enumeration, Message};

/// Operation requested by a device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum RequestKind {
    Unknown = 0,
    /// Authenticate the link; must be the first request on a connection
    Open = 1,
    /// Device-to-cloud telemetry event
    SendEvent = 2,
    /// Poll for one cloud-to-device message
    Receive = 3,
    /// Acknowledge a received message by lock token
    Complete = 4,
}

#[derive(Clone, PartialEq, Message)]
pub struct HubRequest {
    #[prost(string, tag = "1")]
    pub device_id: String,

    #[prost(uint64, tag = "2")]
    pub sequence_id: u64,

    #[prost(uint64, tag = "3")]
    pub timestamp_ms: u64,

    #[prost(enumeration = "RequestKind", tag = "4")]
    pub kind: i32,

    #[prost(bytes = "vec", tag = "5")]
    pub payload: Vec<u8>,

    #[prost(string, tag = "6")]
    pub lock_token: String,

    /// Only sent with `Open`
    #[prost(string, tag = "7")]
    pub shared_access_key: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct HubResponse {
    #[prost(uint64, tag = "1")]
    pub sequence_id: u64,

    #[prost(uint32, tag = "2")]
    pub status_code: u32,

    #[prost(string, tag = "3")]
    pub status_message: String,

    #[prost(bytes = "vec", tag = "4")]
    pub payload: Vec<u8>,

    #[prost(string, tag = "5")]
    pub lock_token: String,
}
