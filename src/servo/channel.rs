//! Servo channel bound to a shared connection

use super::{Calibration, MAX_MOTION_LIMIT, MotionServo, PositionServo};
use crate::config::ServoConfig;
use crate::connection::{Connection, SharedConnection};
use crate::error::{Error, Result};
use crate::protocol::{
    MAX_CHANNEL, Packet, decode_position, encode_get_position, encode_set_acceleration,
    encode_set_position, encode_set_speed,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// One servo output on the controller
///
/// Holds only a `Weak` handle to the connection: dropping the connection
/// turns every I/O call on the channel into `NotConnected`.
#[derive(Debug, Clone)]
pub struct Channel {
    index: u16,
    calibration: Calibration,
    connection: Weak<Mutex<Connection>>,
}

impl Channel {
    /// Bind channel `index` (0-based wire numbering) to `connection`
    pub fn new(index: u16, calibration: Calibration, connection: &SharedConnection) -> Result<Self> {
        if index > u16::from(MAX_CHANNEL) {
            return Err(Error::out_of_range("channel", index, 0, MAX_CHANNEL));
        }
        Ok(Self {
            index,
            calibration,
            connection: Arc::downgrade(connection),
        })
    }

    /// Build from a `[[servos]]` config entry
    pub fn from_config(config: &ServoConfig, connection: &SharedConnection) -> Result<Self> {
        Self::new(config.channel, config.calibration()?, connection)
    }

    /// `(min, neutral, max)` in microseconds for the vendor configuration tool
    pub fn control_center_values(&self) -> (f64, f64, f64) {
        self.calibration.control_center_values()
    }

    #[inline]
    fn wire_channel(&self) -> u8 {
        // Bounded by MAX_CHANNEL in `new`
        self.index as u8
    }

    fn transact(&self, packet: &Packet) -> Result<Vec<u8>> {
        let Some(connection) = self.connection.upgrade() else {
            return Err(Error::NotConnected {
                operation: packet.command_id().name(),
            });
        };
        let mut connection = connection.lock();
        connection.transact(packet)
    }

    fn check_motion_limit(quantity: &'static str, value: u16) -> Result<u16> {
        if value > MAX_MOTION_LIMIT {
            return Err(Error::out_of_range(quantity, value, 0, MAX_MOTION_LIMIT));
        }
        Ok(value)
    }
}

impl PositionServo for Channel {
    fn index(&self) -> u16 {
        self.index
    }

    fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    fn set_position_raw(&self, raw: u16) -> Result<u16> {
        let raw = self.calibration.check_raw(raw)?;
        let packet = encode_set_position(self.wire_channel(), raw)?;
        self.transact(&packet)?;
        log::debug!("Servo {}: position -> {}", self.index, raw);
        Ok(raw)
    }

    fn get_position_raw(&self) -> Result<u16> {
        let packet = encode_get_position(self.wire_channel())?;
        let response = self.transact(&packet)?;
        let position = decode_position([response[0], response[1]]);
        log::debug!("Servo {}: position is {}", self.index, position);
        Ok(position)
    }
}

impl MotionServo for Channel {
    fn set_speed(&self, speed: u16) -> Result<u16> {
        let speed = Self::check_motion_limit("speed", speed)?;
        self.transact(&encode_set_speed(self.wire_channel(), speed)?)?;
        log::debug!("Servo {}: speed -> {}", self.index, speed);
        Ok(speed)
    }

    fn set_acceleration(&self, acceleration: u16) -> Result<u16> {
        let acceleration = Self::check_motion_limit("acceleration", acceleration)?;
        self.transact(&encode_set_acceleration(self.wire_channel(), acceleration)?)?;
        log::debug!("Servo {}: acceleration -> {}", self.index, acceleration);
        Ok(acceleration)
    }
}
