//! Device connection string parsing
//!
//! Format: `HostName=<host>[:<port>];DeviceId=<id>;SharedAccessKey=<key>`.
//! Keys are case-sensitive and unknown keys are ignored.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Port used when `HostName` carries none
pub const DEFAULT_HUB_PORT: u16 = 8080;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStringError {
    #[error("segment `{0}` is not a key=value pair")]
    MalformedSegment(String),

    #[error("missing `{0}`")]
    MissingKey(&'static str),
}

/// Parsed device credentials
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    host_name: String,
    device_id: String,
    shared_access_key: String,
}

impl ConnectionString {
    pub fn parse(input: &str) -> Result<Self, ConnectionStringError> {
        let mut host_name = None;
        let mut device_id = None;
        let mut shared_access_key = None;

        for segment in input.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.to_string()))?;

            let slot = match key {
                "HostName" => &mut host_name,
                "DeviceId" => &mut device_id,
                "SharedAccessKey" => &mut shared_access_key,
                _ => continue,
            };
            if !value.is_empty() {
                *slot = Some(value.to_string());
            }
        }

        Ok(Self {
            host_name: host_name.ok_or(ConnectionStringError::MissingKey("HostName"))?,
            device_id: device_id.ok_or(ConnectionStringError::MissingKey("DeviceId"))?,
            shared_access_key: shared_access_key
                .ok_or(ConnectionStringError::MissingKey("SharedAccessKey"))?,
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn shared_access_key(&self) -> &str {
        &self.shared_access_key
    }

    /// Socket address of the hub, `host:port`
    ///
    /// IPv6 hosts are bracketed; a port is only taken from `[v6]:port`.
    pub fn address(&self) -> String {
        let host = self.host_name.as_str();

        if let Some(rest) = host.strip_prefix('[') {
            return match rest.split_once(']') {
                Some((_, tail)) if tail.strip_prefix(':').is_some_and(is_port) => {
                    host.to_string()
                }
                Some((ip, _)) => format!("[{}]:{}", ip, DEFAULT_HUB_PORT),
                None => format!("{}]:{}", host, DEFAULT_HUB_PORT),
            };
        }

        match host.rsplit_once(':') {
            Some((name, port)) if !name.contains(':') && is_port(port) => host.to_string(),
            Some(_) => format!("[{}]:{}", host, DEFAULT_HUB_PORT),
            None => format!("{}:{}", host, DEFAULT_HUB_PORT),
        }
    }
}

fn is_port(s: &str) -> bool {
    s.parse::<u16>().is_ok()
}

impl FromStr for ConnectionString {
    type Err = ConnectionStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Keep the key out of logs
impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("host_name", &self.host_name)
            .field("device_id", &self.device_id)
            .field("shared_access_key", &"<redacted>")
            .finish()
    }
}
