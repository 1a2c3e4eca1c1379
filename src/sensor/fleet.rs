//! Fleet of simulated devices and their random walk

use super::reading::{Fixed13, SensorReading};
use rand::Rng;
use tracing::debug;

/// Maximum deviation applied to each field in one step
#[derive(Debug, Clone, PartialEq)]
pub struct DriftProfile {
    pub celsius: f64,
    pub relative_humidity: f64,
    pub pressure: f64,
    pub altitude_f: f64,
    /// Applied around the pre-step `altitude_f`, not around `altitude_m`
    pub altitude_m: f64,
}

impl Default for DriftProfile {
    fn default() -> Self {
        Self {
            celsius: 1.0,
            relative_humidity: 2.0,
            pressure: 1.0,
            altitude_f: 1.0,
            altitude_m: 0.3,
        }
    }
}

/// Uniform value in `[value - deviation, value + deviation)`, rounded
fn random_walk<R: Rng + ?Sized>(rng: &mut R, value: Fixed13, deviation: f64) -> Fixed13 {
    let min = value.value() - deviation;
    let max = value.value() + deviation;
    Fixed13::new(min + rng.gen::<f64>() * (max - min))
}

/// Advance one reading by a single random-walk step
///
/// Returns the new reading; the input is left untouched.
pub fn step<R: Rng + ?Sized>(
    reading: &SensorReading,
    profile: &DriftProfile,
    rng: &mut R,
) -> SensorReading {
    debug!("Stepping sensor {}", reading.device_id());

    let celsius = random_walk(rng, reading.celsius, profile.celsius);
    let relative_humidity = random_walk(rng, reading.relative_humidity, profile.relative_humidity);
    let pressure = random_walk(rng, reading.pressure, profile.pressure);
    let altitude_f = random_walk(rng, reading.altitude_f, profile.altitude_f);
    let altitude_m = random_walk(rng, reading.altitude_f, profile.altitude_m);

    reading.with_values(celsius, relative_humidity, pressure, altitude_f, altitude_m)
}

/// The fixed, ordered set of simulated devices
#[derive(Debug, Clone)]
pub struct SensorFleet {
    readings: Vec<SensorReading>,
    profile: DriftProfile,
}

impl SensorFleet {
    /// Create the five seeded devices
    pub fn initialize() -> Self {
        Self::with_profile(DriftProfile::default())
    }

    /// Create the five seeded devices with custom step deviations
    pub fn with_profile(profile: DriftProfile) -> Self {
        let readings = vec![
            SensorReading::seed("MyDevice01", "kitchen", 74.0, 23.3),
            SensorReading::seed("MyDevice02", "living-room", 72.0, 22.2),
            SensorReading::seed("MyDevice03", "bedroom1", 71.0, 21.6),
            SensorReading::seed("MyDevice04", "front-porch", 61.0, 16.6),
            SensorReading::seed("MyDevice05", "garage", 69.0, 20.5),
        ];

        Self { readings, profile }
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Replace the reading at `index` with its next step and return it
    pub fn step_device<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        rng: &mut R,
    ) -> Option<&SensorReading> {
        let slot = self.readings.get_mut(index)?;
        *slot = step(slot, &self.profile, rng);
        Some(&*slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    // Rounding to 13 digits may move a value by at most 5e-14
    const ROUNDING_SLACK: f64 = 1e-12;

    fn within(after: Fixed13, before: Fixed13, deviation: f64) -> bool {
        (after.value() - before.value()).abs() <= deviation + ROUNDING_SLACK
    }

    #[test]
    fn test_initialize_seeds_five_devices() {
        let fleet = SensorFleet::initialize();
        assert_eq!(fleet.len(), 5);

        let expected = [
            ("MyDevice01", "kitchen", 74.0, 23.3),
            ("MyDevice02", "living-room", 72.0, 22.2),
            ("MyDevice03", "bedroom1", 71.0, 21.6),
            ("MyDevice04", "front-porch", 61.0, 16.6),
            ("MyDevice05", "garage", 69.0, 20.5),
        ];

        let readings = fleet.readings().iter();
        for (reading, (id, location, fahrenheit, celsius)) in readings.zip(expected) {
            assert_eq!(reading.device_id(), id);
            assert_eq!(reading.location(), location);
            assert_eq!(reading.fahrenheit, fahrenheit);
            assert_eq!(reading.celsius.value(), celsius);
            assert_eq!(reading.relative_humidity.value(), 38.124603271484375);
            assert_eq!(reading.pressure.value(), 100.99);
            assert_eq!(reading.altitude_f.value(), 198.6958725);
            assert_eq!(reading.altitude_m.value(), 60.5625);
        }

        let ids: HashSet<&str> = fleet.readings().iter().map(|r| r.device_id()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_step_derives_fahrenheit_from_celsius() {
        let mut rng = StdRng::seed_from_u64(7);
        let profile = DriftProfile::default();

        for reading in SensorFleet::initialize().readings() {
            let next = step(reading, &profile, &mut rng);
            assert_eq!(next.fahrenheit, next.celsius.value() * 9.0 / 5.0 + 32.0);
        }
    }

    #[test]
    fn test_step_stays_within_deviation_bands() {
        let mut rng = StdRng::seed_from_u64(42);
        let profile = DriftProfile::default();

        for reading in SensorFleet::initialize().readings() {
            let mut current = reading.clone();
            for _ in 0..200 {
                let next = step(&current, &profile, &mut rng);
                assert!(within(next.celsius, current.celsius, 1.0));
                assert!(within(next.relative_humidity, current.relative_humidity, 2.0));
                assert!(within(next.pressure, current.pressure, 1.0));
                assert!(within(next.altitude_f, current.altitude_f, 1.0));
                // altitude_m walks around the previous altitude_f
                assert!(within(next.altitude_m, current.altitude_f, 0.3));
                current = next;
            }
        }
    }

    #[test]
    fn test_thousand_steps_never_jump_more_than_one_degree() {
        let mut rng = StdRng::seed_from_u64(1000);
        let profile = DriftProfile::default();
        let mut current = SensorFleet::initialize().readings()[0].clone();
        assert_eq!(current.device_id(), "MyDevice01");

        for _ in 0..1000 {
            let next = step(&current, &profile, &mut rng);
            assert!(within(next.celsius, current.celsius, 1.0));
            assert!((next.celsius.value() - 23.3).abs() <= 1000.0);
            current = next;
        }
    }

    #[test]
    fn test_step_leaves_input_untouched() {
        let mut rng = StdRng::seed_from_u64(3);
        let reading = SensorReading::seed("MyDevice02", "living-room", 72.0, 22.2);
        let before = reading.clone();

        let next = step(&reading, &DriftProfile::default(), &mut rng);
        assert_eq!(reading, before);
        assert_eq!(next.device_id(), reading.device_id());
        assert_eq!(next.location(), reading.location());
    }

    #[test]
    fn test_step_device_replaces_in_place() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut fleet = SensorFleet::initialize();
        let before = fleet.readings()[2].clone();

        let stepped = fleet.step_device(2, &mut rng).expect("device 3 exists").clone();
        assert_eq!(&fleet.readings()[2], &stepped);
        assert_ne!(stepped, before);
        assert_eq!(fleet.readings()[0].celsius.value(), 23.3);

        assert!(fleet.step_device(5, &mut rng).is_none());
    }

    #[test]
    fn test_zero_drift_profile_freezes_values() {
        let profile = DriftProfile {
            celsius: 0.0,
            relative_humidity: 0.0,
            pressure: 0.0,
            altitude_f: 0.0,
            altitude_m: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut fleet = SensorFleet::with_profile(profile);

        let reading = fleet.step_device(0, &mut rng).expect("device 1 exists").clone();
        assert_eq!(reading.celsius.value(), 23.3);
        assert_eq!(reading.pressure.value(), 100.99);
        // altitude_m in the body repeats altitude_f
        assert_eq!(reading.altitude_m, reading.altitude_f);
    }
}
