//! Servo channels with calibrated, range-checked motion
//!
//! Two capability contracts:
//! - [`PositionServo`]: position in raw units, degrees and radians
//! - [`MotionServo`]: additionally limits speed and acceleration
//!
//! Degree and radian operations are provided on top of the raw ones, so an
//! implementation only has to talk to the wire in raw units.

mod calibration;
mod channel;

pub use calibration::{
    Calibration, DEFAULT_MAX_DEGREES, DEFAULT_MIN_DEGREES, DEGREES_TO_MICROSECONDS,
    MICROSECONDS_TO_UNITS, UNITS_PER_DEGREE,
};
pub use channel::Channel;

use crate::error::Result;

/// Largest speed/acceleration limit; 0 means unlimited
pub const MAX_MOTION_LIMIT: u16 = 255;

/// Position control of one servo
pub trait PositionServo {
    /// Wire channel index (0-based)
    fn index(&self) -> u16;

    /// Calibrated working range
    fn calibration(&self) -> &Calibration;

    /// Move to `raw` (quarter-microseconds); returns the value sent
    fn set_position_raw(&self, raw: u16) -> Result<u16>;

    /// Current position in raw units, as reported by the controller
    fn get_position_raw(&self) -> Result<u16>;

    /// `(min, neutral, max)` in raw units, no I/O
    fn calibration_summary(&self) -> (u16, u16, u16) {
        self.calibration().summary()
    }

    /// Move to the calibrated neutral, regardless of the degree limits
    fn center(&self) -> Result<u16> {
        self.set_position_raw(self.calibration().neutral())
    }

    /// Move to `degrees` from neutral; returns the value sent
    fn set_position_degrees(&self, degrees: i32) -> Result<i32> {
        let raw = self.calibration().degrees_to_raw(degrees)?;
        self.set_position_raw(raw)?;
        Ok(degrees)
    }

    /// Move to `radians` from neutral, rounded to whole degrees
    ///
    /// Returns the radian value of the degree actually commanded.
    fn set_position_radians(&self, radians: f64) -> Result<f64> {
        let degrees = self.calibration().radians_to_degrees(radians)?;
        let degrees = self.set_position_degrees(degrees)?;
        Ok(f64::from(degrees).to_radians())
    }

    /// Current position in whole degrees from neutral
    fn get_position_degrees(&self) -> Result<i32> {
        let raw = self.get_position_raw()?;
        Ok(self.calibration().raw_to_degrees(raw))
    }

    /// Current position in radians from neutral
    fn get_position_radians(&self) -> Result<f64> {
        let raw = self.get_position_raw()?;
        Ok(self.calibration().raw_to_radians(raw))
    }
}

/// Position control plus speed and acceleration limits
///
/// Limits are `1..=255`, or `0` for unlimited. Larger values are rejected.
pub trait MotionServo: PositionServo {
    /// Speed limit in quarter-microseconds per 10 ms
    fn set_speed(&self, speed: u16) -> Result<u16>;

    /// Acceleration limit in quarter-microseconds per 10 ms per 80 ms
    fn set_acceleration(&self, acceleration: u16) -> Result<u16>;
}
