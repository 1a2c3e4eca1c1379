//! Device sessions and their cloud-to-device mailboxes
//!
//! This module handles:
//! - Opening a device link and rejecting requests before it
//! - Accepting telemetry events
//! - Delivering queued messages under lock tokens and completing them
//! - Requeueing uncompleted messages when a device disconnects

mod connection;
mod mailbox;

pub use connection::DeviceSession;
pub use mailbox::Mailbox;
