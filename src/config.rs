//! Simulator configuration from the environment

use crate::publisher::Cadence;
use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Used when `IOTHUB_CONN` is unset; parsing it fails, so every hub
/// operation reports an error instead of the process refusing to start
pub const PLACEHOLDER_CONNECTION_STRING: &str =
    "YOUR IOT HUB DEVICE-SPECIFIC CONNECTION STRING HERE";

/// Runtime settings for the simulator
#[derive(Clone)]
pub struct SimulatorConfig {
    /// Device connection string for the hub
    pub connection_string: String,
    pub publish_interval: Duration,
    pub receive_interval: Duration,
    pub connect_timeout: Duration,
    /// Applies to each request/response exchange
    pub request_timeout: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        let cadence = Cadence::default();
        Self {
            connection_string: PLACEHOLDER_CONNECTION_STRING.into(),
            publish_interval: cadence.publish,
            receive_interval: cadence.receive,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl SimulatorConfig {
    /// Read `IOTHUB_CONN` and the `SIM_*_SECS` overrides
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            connection_string: lookup("IOTHUB_CONN")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.connection_string),
            publish_interval: seconds(
                &lookup,
                "SIM_PUBLISH_INTERVAL_SECS",
                defaults.publish_interval,
            )?,
            receive_interval: seconds(
                &lookup,
                "SIM_RECEIVE_INTERVAL_SECS",
                defaults.receive_interval,
            )?,
            connect_timeout: seconds(
                &lookup,
                "SIM_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout,
            )?,
            request_timeout: seconds(
                &lookup,
                "SIM_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout,
            )?,
        })
    }

    pub fn cadence(&self) -> Cadence {
        Cadence {
            publish: self.publish_interval,
            receive: self.receive_interval,
        }
    }
}

/// Positive whole seconds from `key`, or `default` when unset
fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a whole number of seconds, got {:?}", key, raw))?;
    if secs == 0 {
        bail!("{} must be greater than zero", key);
    }

    Ok(Duration::from_secs(secs))
}
