//! Periodic telemetry publishing and inbound message polling
//!
//! This module handles:
//! - Stepping and sending every device's telemetry on the publish cadence
//! - Polling, logging and acknowledging inbound messages on the receive cadence
//! - Logging operation results without propagating failures

mod cycle;
mod report;
mod scheduler;

pub use scheduler::{Cadence, Scheduler};
