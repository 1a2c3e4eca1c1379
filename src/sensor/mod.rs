//! Simulated sensor fleet
//!
//! This module handles:
//! - The five seeded device readings
//! - Bounded random-walk steps applied every publish cycle
//! - The JSON telemetry body sent for each reading

mod fleet;
mod reading;

pub use fleet::SensorFleet;
