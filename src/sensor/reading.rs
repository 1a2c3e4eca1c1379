//! Sensor readings and their telemetry encoding

use serde::{Serialize, Serializer};
use std::fmt;

/// Humidity shared by every seeded device
const SEED_RELATIVE_HUMIDITY: f64 = 38.124603271484375;
const SEED_PRESSURE: f64 = 100.99;
const SEED_ALTITUDE_F: f64 = 198.6958725;
const SEED_ALTITUDE_M: f64 = 60.5625;

/// A decimal rounded to 13 fractional digits
///
/// Serializes as its fixed-point text (`"23.3000000000000"`), not as a JSON
/// number, so the wire form never depends on float-to-text shortest formatting.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Fixed13(f64);

impl Fixed13 {
    /// Fractional digits kept
    pub const DIGITS: usize = 13;

    /// Round `value` to 13 fractional digits
    pub fn new(value: f64) -> Self {
        let text = format!("{:.*}", Self::DIGITS, value);
        Self(text.parse().unwrap_or(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Fixed13 {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Fixed13 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", Self::DIGITS, self.0)
    }
}

impl Serialize for Fixed13 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Last known physical state of one simulated device
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    device_id: String,
    location: String,
    pub fahrenheit: f64,
    pub celsius: Fixed13,
    pub relative_humidity: Fixed13,
    pub pressure: Fixed13,
    pub altitude_f: Fixed13,
    pub altitude_m: Fixed13,
}

impl SensorReading {
    /// Create a seeded reading; humidity, pressure and altitude start at the
    /// values every simulated device shares
    pub fn seed(
        device_id: impl Into<String>,
        location: impl Into<String>,
        fahrenheit: f64,
        celsius: f64,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            location: location.into(),
            fahrenheit,
            celsius: celsius.into(),
            relative_humidity: SEED_RELATIVE_HUMIDITY.into(),
            pressure: SEED_PRESSURE.into(),
            altitude_f: SEED_ALTITUDE_F.into(),
            altitude_m: SEED_ALTITUDE_M.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Same identity, new physical values
    pub(crate) fn with_values(
        &self,
        celsius: Fixed13,
        relative_humidity: Fixed13,
        pressure: Fixed13,
        altitude_f: Fixed13,
        altitude_m: Fixed13,
    ) -> Self {
        Self {
            device_id: self.device_id.clone(),
            location: self.location.clone(),
            fahrenheit: celsius.value() * 9.0 / 5.0 + 32.0,
            celsius,
            relative_humidity,
            pressure,
            altitude_f,
            altitude_m,
        }
    }

    /// Serialize the telemetry body for this reading
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&TelemetryMessage::from(self))
    }
}

/// JSON body sent to the hub for one reading
///
/// `altitude_m` carries the `altitude_f` value; consumers of the existing
/// message stream rely on that.
#[derive(Debug, Serialize)]
pub struct TelemetryMessage<'a> {
    #[serde(rename = "deviceId")]
    pub device_id: &'a str,
    pub location: &'a str,
    pub fahrenheit: f64,
    pub celsius: Fixed13,
    #[serde(rename = "relativeHumidity")]
    pub relative_humidity: Fixed13,
    pub pressure: Fixed13,
    pub altitude_f: Fixed13,
    pub altitude_m: Fixed13,
}

impl<'a> From<&'a SensorReading> for TelemetryMessage<'a> {
    fn from(reading: &'a SensorReading) -> Self {
        Self {
            device_id: &reading.device_id,
            location: &reading.location,
            fahrenheit: reading.fahrenheit,
            celsius: reading.celsius,
            relative_humidity: reading.relative_humidity,
            pressure: reading.pressure,
            altitude_f: reading.altitude_f,
            altitude_m: reading.altitude_f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_fixed13_rounds_and_formats() {
        let v = Fixed13::new(23.123456789012345);
        assert_eq!(v.to_string(), "23.1234567890123");
        assert_eq!(v.value(), 23.1234567890123);

        assert_eq!(Fixed13::new(23.3).to_string(), "23.3000000000000");
        assert_eq!(Fixed13::new(-0.5).to_string(), "-0.5000000000000");
    }

    #[test]
    fn test_json_has_exactly_the_telemetry_keys() {
        let mut reading = SensorReading::seed("MyDevice01", "kitchen", 74.0, 23.3);
        reading.altitude_m = Fixed13::new(1.0);

        let json = reading.to_json().expect("serialize");
        let value: Value = serde_json::from_str(&json).expect("valid json");
        let object = value.as_object().expect("json object");

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "altitude_f",
                "altitude_m",
                "celsius",
                "deviceId",
                "fahrenheit",
                "location",
                "pressure",
                "relativeHumidity",
            ]
        );

        assert_eq!(object["deviceId"], "MyDevice01");
        assert_eq!(object["location"], "kitchen");
        assert_eq!(object["celsius"], "23.3000000000000");
        assert!(object["fahrenheit"].is_number());
        // altitude_m mirrors altitude_f, not the stored altitude_m
        assert_eq!(object["altitude_m"], object["altitude_f"]);
        assert_eq!(object["altitude_f"], "198.6958725000000");
    }

    #[test]
    fn test_with_values_keeps_identity() {
        let reading = SensorReading::seed("MyDevice05", "garage", 69.0, 20.5);
        let next = reading.with_values(
            Fixed13::new(10.0),
            reading.relative_humidity,
            reading.pressure,
            reading.altitude_f,
            reading.altitude_m,
        );
        assert_eq!(next.device_id(), "MyDevice05");
        assert_eq!(next.location(), "garage");
        assert_eq!(next.fahrenheit, 50.0);
    }
}
