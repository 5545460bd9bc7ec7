//! Per-channel calibration and unit conversion
//!
//! Raw positions are quarter-microseconds of pulse width. One degree of servo
//! travel is 10 us of pulse width, so one degree is 40 raw units:
//!
//! ```text
//! raw = neutral + degrees * DEGREES_TO_MICROSECONDS * MICROSECONDS_TO_UNITS
//! ```

use crate::error::{Error, Result};
use crate::protocol::MAX_14BIT;

/// Pulse width change per degree of travel (us)
pub const DEGREES_TO_MICROSECONDS: i32 = 10;

/// Raw units per microsecond (the controller counts quarter-microseconds)
pub const MICROSECONDS_TO_UNITS: i32 = 4;

/// Raw units per degree of travel
pub const UNITS_PER_DEGREE: i32 = DEGREES_TO_MICROSECONDS * MICROSECONDS_TO_UNITS;

/// Default lower degree limit
pub const DEFAULT_MIN_DEGREES: i32 = -90;

/// Default upper degree limit
pub const DEFAULT_MAX_DEGREES: i32 = 90;

/// Calibrated working range of one servo
///
/// `neutral` and `delta` come from the vendor configuration tool. The servo
/// may move `delta` raw units to either side of `neutral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    neutral: u16,
    delta: u16,
    min_degrees: i32,
    max_degrees: i32,
}

impl Calibration {
    /// Create a calibration with the default `[-90, 90]` degree limits
    ///
    /// Fails unless `neutral > delta` and `neutral + delta` fits in 14 bits.
    pub fn new(neutral: u16, delta: u16) -> Result<Self> {
        if neutral <= delta {
            return Err(Error::InvalidCalibration(format!(
                "neutral ({}) must be greater than delta ({})",
                neutral, delta
            )));
        }
        let max = u32::from(neutral) + u32::from(delta);
        if max > u32::from(MAX_14BIT) {
            return Err(Error::InvalidCalibration(format!(
                "neutral + delta ({}) exceeds the protocol maximum ({})",
                max, MAX_14BIT
            )));
        }
        Ok(Self {
            neutral,
            delta,
            min_degrees: DEFAULT_MIN_DEGREES,
            max_degrees: DEFAULT_MAX_DEGREES,
        })
    }

    /// Replace the degree limits
    pub fn with_degree_limits(self, min_degrees: i32, max_degrees: i32) -> Result<Self> {
        if min_degrees > max_degrees {
            return Err(Error::InvalidCalibration(format!(
                "min_degrees ({}) is above max_degrees ({})",
                min_degrees, max_degrees
            )));
        }
        Ok(Self {
            min_degrees,
            max_degrees,
            ..self
        })
    }

    #[inline]
    pub fn neutral(&self) -> u16 {
        self.neutral
    }

    #[inline]
    pub fn delta(&self) -> u16 {
        self.delta
    }

    /// Lowest allowed raw position
    #[inline]
    pub fn min(&self) -> u16 {
        self.neutral - self.delta
    }

    /// Highest allowed raw position
    #[inline]
    pub fn max(&self) -> u16 {
        self.neutral + self.delta
    }

    #[inline]
    pub fn min_degrees(&self) -> i32 {
        self.min_degrees
    }

    #[inline]
    pub fn max_degrees(&self) -> i32 {
        self.max_degrees
    }

    /// `(min, neutral, max)` in raw units
    pub fn summary(&self) -> (u16, u16, u16) {
        (self.min(), self.neutral, self.max())
    }

    /// `(min, neutral, max)` in microseconds, as entered in the vendor tool
    pub fn control_center_values(&self) -> (f64, f64, f64) {
        let to_us = |raw: u16| f64::from(raw) / f64::from(MICROSECONDS_TO_UNITS);
        (to_us(self.min()), to_us(self.neutral), to_us(self.max()))
    }

    /// Reject raw positions outside `[min, max]`
    pub fn check_raw(&self, raw: u16) -> Result<u16> {
        if raw < self.min() || raw > self.max() {
            return Err(Error::out_of_range("position", raw, self.min(), self.max()));
        }
        Ok(raw)
    }

    /// Reject degrees outside `[min_degrees, max_degrees]`
    pub fn check_degrees(&self, degrees: i32) -> Result<i32> {
        if degrees < self.min_degrees || degrees > self.max_degrees {
            return Err(Error::out_of_range(
                "degrees",
                degrees,
                self.min_degrees,
                self.max_degrees,
            ));
        }
        Ok(degrees)
    }

    /// Map degrees to a raw position
    ///
    /// Only the degree limits are checked here; the result still has to pass
    /// [`check_raw`](Self::check_raw) before it may be sent.
    pub fn degrees_to_raw(&self, degrees: i32) -> Result<u16> {
        self.check_degrees(degrees)?;
        let raw = i64::from(self.neutral) + i64::from(degrees) * i64::from(UNITS_PER_DEGREE);
        u16::try_from(raw).map_err(|_| Error::out_of_range("position", raw, self.min(), self.max()))
    }

    /// Round radians to whole degrees (half away from zero) and check the limits
    ///
    /// The comparison happens on the rounded integer, so values a hair past a
    /// boundary because of floating point still land on it.
    pub fn radians_to_degrees(&self, radians: f64) -> Result<i32> {
        let degrees = radians.to_degrees().round();
        if !degrees.is_finite()
            || degrees < f64::from(self.min_degrees)
            || degrees > f64::from(self.max_degrees)
        {
            // `as` saturates, NaN becomes 0
            return Err(Error::out_of_range(
                "degrees",
                degrees as i64,
                self.min_degrees,
                self.max_degrees,
            ));
        }
        Ok(degrees as i32)
    }

    /// Raw position to whole degrees, rounded half away from zero
    pub fn raw_to_degrees(&self, raw: u16) -> i32 {
        self.raw_to_exact_degrees(raw).round() as i32
    }

    /// Raw position to radians, without rounding through whole degrees
    pub fn raw_to_radians(&self, raw: u16) -> f64 {
        self.raw_to_exact_degrees(raw).to_radians()
    }

    fn raw_to_exact_degrees(&self, raw: u16) -> f64 {
        (f64::from(raw) - f64::from(self.neutral)) / f64::from(UNITS_PER_DEGREE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn standard() -> Calibration {
        Calibration::new(6000, 3600).unwrap()
    }

    #[test]
    fn test_bounds() {
        let cal = standard();
        assert_eq!(cal.summary(), (2400, 6000, 9600));
        assert_eq!(cal.control_center_values(), (600.0, 1500.0, 2400.0));
        assert_eq!(cal.min_degrees(), -90);
        assert_eq!(cal.max_degrees(), 90);
    }

    #[test]
    fn test_invalid_calibrations() {
        assert!(matches!(
            Calibration::new(3000, 3000),
            Err(Error::InvalidCalibration(_))
        ));
        assert!(Calibration::new(100, 200).is_err());
        assert!(Calibration::new(12000, 4384).is_err());
        assert!(Calibration::new(12000, 4383).is_ok());
        assert!(standard().with_degree_limits(10, -10).is_err());
    }

    #[test]
    fn test_minimum_range_keeps_min_positive() {
        let cal = Calibration::new(1, 0).unwrap();
        assert_eq!(cal.min(), 1);
        assert_eq!(cal.max(), 1);
    }

    #[test]
    fn test_degrees_to_raw() {
        let cal = standard();
        assert_eq!(cal.degrees_to_raw(0).unwrap(), 6000);
        assert_eq!(cal.degrees_to_raw(90).unwrap(), 9600);
        assert_eq!(cal.degrees_to_raw(-90).unwrap(), 2400);
        assert_eq!(cal.degrees_to_raw(-45).unwrap(), 4200);
        assert!(cal.degrees_to_raw(91).is_err());
        assert!(cal.degrees_to_raw(-91).is_err());
    }

    #[test]
    fn test_degrees_below_zero_raw() {
        // Wide degree limits on a low neutral would go negative
        let cal = Calibration::new(2000, 1000)
            .unwrap()
            .with_degree_limits(-180, 180)
            .unwrap();
        assert!(matches!(
            cal.degrees_to_raw(-60),
            Err(Error::OutOfRange {
                quantity: "position",
                value: -400,
                ..
            })
        ));
    }

    #[test]
    fn test_radians_rounding() {
        let cal = standard();
        assert_eq!(cal.radians_to_degrees(0.0).unwrap(), 0);
        assert_eq!(cal.radians_to_degrees(FRAC_PI_2).unwrap(), 90);
        assert_eq!(cal.radians_to_degrees(-FRAC_PI_2).unwrap(), -90);
        assert_eq!(cal.radians_to_degrees(FRAC_PI_4).unwrap(), 45);
        // -1.5 rad = -85.94 deg
        assert_eq!(cal.radians_to_degrees(-1.5).unwrap(), -86);
        assert_eq!(cal.radians_to_degrees(1.5).unwrap(), 86);
        // 0.01 rad = 0.57 deg
        assert_eq!(cal.radians_to_degrees(0.01).unwrap(), 1);
        assert_eq!(cal.radians_to_degrees(-0.01).unwrap(), -1);
    }

    #[test]
    fn test_radians_out_of_range() {
        let cal = standard();
        // 90.4 deg rounds to 90 and is accepted, 90.6 rounds to 91
        assert_eq!(cal.radians_to_degrees(90.4f64.to_radians()).unwrap(), 90);
        assert!(cal.radians_to_degrees(90.6f64.to_radians()).is_err());
        assert!(cal.radians_to_degrees(PI).is_err());
        assert!(cal.radians_to_degrees(f64::NAN).is_err());
        assert!(cal.radians_to_degrees(f64::INFINITY).is_err());
    }

    #[test]
    fn test_raw_to_angles() {
        let cal = standard();
        assert_eq!(cal.raw_to_degrees(6000), 0);
        assert_eq!(cal.raw_to_degrees(9600), 90);
        assert_eq!(cal.raw_to_degrees(2400), -90);
        // 20 units is half a degree
        assert_eq!(cal.raw_to_degrees(6020), 1);
        assert_eq!(cal.raw_to_degrees(5980), -1);
        assert_eq!(cal.raw_to_degrees(6019), 0);

        assert!((cal.raw_to_radians(9600) - FRAC_PI_2).abs() < 1e-12);
        assert!((cal.raw_to_radians(6020) - 0.5f64.to_radians()).abs() < 1e-12);
    }
}
