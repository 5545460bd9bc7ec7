//! Zero-allocation packet encoding and response decoding

use super::commands::CommandId;
use super::{MAX_14BIT, MAX_CHANNEL};
use crate::error::{Error, Result};

/// Maximum packet size (set commands: 4 bytes)
const MAX_PACKET_SIZE: usize = 4;

/// Encoded command ready for the wire
///
/// Fixed 4-byte buffer, so building a command never touches the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    id: CommandId,
    data: [u8; MAX_PACKET_SIZE],
    len: usize,
}

impl Packet {
    fn new(id: CommandId) -> Self {
        let mut data = [0u8; MAX_PACKET_SIZE];
        data[0] = id as u8;
        Self {
            id,
            data,
            len: id.frame_len(),
        }
    }

    /// Get packet bytes for sending
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Command this packet carries
    #[inline]
    pub fn command_id(&self) -> CommandId {
        self.id
    }

    /// Addressed channel, for commands that carry one
    #[inline]
    pub fn channel(&self) -> Option<u8> {
        (self.len >= 2).then_some(self.data[1])
    }

    /// Number of bytes the controller answers with
    #[inline]
    pub fn response_len(&self) -> usize {
        self.command_id().response_len()
    }

    fn with_channel(id: CommandId, channel: u8) -> Result<Self> {
        if channel > MAX_CHANNEL {
            return Err(Error::out_of_range("channel", channel, 0, MAX_CHANNEL));
        }
        let mut packet = Self::new(id);
        packet.data[1] = channel;
        Ok(packet)
    }

    /// Channel command with a 14-bit value split low group first
    fn with_value(id: CommandId, channel: u8, value: u16, quantity: &'static str) -> Result<Self> {
        if value > MAX_14BIT {
            return Err(Error::out_of_range(quantity, value, 0, MAX_14BIT));
        }
        let mut packet = Self::with_channel(id, channel)?;
        packet.data[2] = (value & 0x7F) as u8;
        packet.data[3] = ((value >> 7) & 0x7F) as u8;
        Ok(packet)
    }
}

/// Set target position (CMD 0x84)
///
/// `position` is in quarter-microseconds; 1500 us is 6000.
pub fn encode_set_position(channel: u8, position: u16) -> Result<Packet> {
    Packet::with_value(CommandId::SetPosition, channel, position, "position")
}

/// Set speed limit (CMD 0x87)
pub fn encode_set_speed(channel: u8, speed: u16) -> Result<Packet> {
    Packet::with_value(CommandId::SetSpeed, channel, speed, "speed")
}

/// Set acceleration limit (CMD 0x89)
pub fn encode_set_acceleration(channel: u8, acceleration: u16) -> Result<Packet> {
    Packet::with_value(
        CommandId::SetAcceleration,
        channel,
        acceleration,
        "acceleration",
    )
}

/// Get position (CMD 0x90), answered with 2 bytes
pub fn encode_get_position(channel: u8) -> Result<Packet> {
    Packet::with_channel(CommandId::GetPosition, channel)
}

/// Get moving state (CMD 0x93), answered with 1 byte
///
/// Applies to all channels, so there is no channel byte.
pub fn encode_get_moving_state() -> Packet {
    Packet::new(CommandId::GetMovingState)
}

/// Decode a get-position reply: `b0 + 256 * b1`
#[inline]
pub fn decode_position(response: [u8; 2]) -> u16 {
    u16::from_le_bytes(response)
}

/// Decode a get-moving-state reply: any non-zero byte means moving
#[inline]
pub fn decode_moving_state(response: [u8; 1]) -> bool {
    response[0] != 0
}
