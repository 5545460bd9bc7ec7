//! Command identifiers and the typed command enum

use super::packet::{
    Packet, encode_get_moving_state, encode_get_position, encode_set_acceleration,
    encode_set_position, encode_set_speed,
};
use crate::error::Result;

/// Maestro command opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandId {
    /// Set target position (quarter-microseconds)
    SetPosition = 0x84,
    /// Set speed limit (quarter-microseconds per 10 ms, 0 = unlimited)
    SetSpeed = 0x87,
    /// Set acceleration limit (quarter-microseconds per 10 ms per 80 ms, 0 = unlimited)
    SetAcceleration = 0x89,
    /// Query current position of one channel (2-byte reply)
    GetPosition = 0x90,
    /// Query whether any channel is still moving (1-byte reply)
    GetMovingState = 0x93,
}

impl CommandId {
    /// Parse an opcode byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x84 => Some(CommandId::SetPosition),
            0x87 => Some(CommandId::SetSpeed),
            0x89 => Some(CommandId::SetAcceleration),
            0x90 => Some(CommandId::GetPosition),
            0x93 => Some(CommandId::GetMovingState),
            _ => None,
        }
    }

    /// Name used in logs and error context
    pub fn name(self) -> &'static str {
        match self {
            CommandId::SetPosition => "SetPosition",
            CommandId::SetSpeed => "SetSpeed",
            CommandId::SetAcceleration => "SetAcceleration",
            CommandId::GetPosition => "GetPosition",
            CommandId::GetMovingState => "GetMovingState",
        }
    }

    /// Total frame length on the wire, opcode included
    pub fn frame_len(self) -> usize {
        match self {
            CommandId::SetPosition | CommandId::SetSpeed | CommandId::SetAcceleration => 4,
            CommandId::GetPosition => 2,
            CommandId::GetMovingState => 1,
        }
    }

    /// Number of bytes the controller replies with
    pub fn response_len(self) -> usize {
        match self {
            CommandId::GetPosition => 2,
            CommandId::GetMovingState => 1,
            _ => 0,
        }
    }
}

/// Maestro commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move `channel` to `position` (raw quarter-microsecond units)
    SetPosition { channel: u8, position: u16 },
    /// Limit the speed of `channel`
    SetSpeed { channel: u8, speed: u16 },
    /// Limit the acceleration of `channel`
    SetAcceleration { channel: u8, acceleration: u16 },
    /// Read back the position of `channel`
    GetPosition { channel: u8 },
    /// Ask whether any channel is moving
    GetMovingState,
}

impl Command {
    /// Get command ID
    pub fn id(&self) -> CommandId {
        match self {
            Command::SetPosition { .. } => CommandId::SetPosition,
            Command::SetSpeed { .. } => CommandId::SetSpeed,
            Command::SetAcceleration { .. } => CommandId::SetAcceleration,
            Command::GetPosition { .. } => CommandId::GetPosition,
            Command::GetMovingState => CommandId::GetMovingState,
        }
    }

    /// Encode to a wire packet, rejecting values the protocol cannot carry
    pub fn encode(&self) -> Result<Packet> {
        match *self {
            Command::SetPosition { channel, position } => encode_set_position(channel, position),
            Command::SetSpeed { channel, speed } => encode_set_speed(channel, speed),
            Command::SetAcceleration {
                channel,
                acceleration,
            } => encode_set_acceleration(channel, acceleration),
            Command::GetPosition { channel } => encode_get_position(channel),
            Command::GetMovingState => Ok(encode_get_moving_state()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_table() {
        for id in [
            CommandId::SetPosition,
            CommandId::SetSpeed,
            CommandId::SetAcceleration,
            CommandId::GetPosition,
            CommandId::GetMovingState,
        ] {
            assert_eq!(CommandId::from_byte(id as u8), Some(id));
            assert!(id as u8 & 0x80 != 0, "{} must have the command bit", id.name());
        }
        assert_eq!(CommandId::from_byte(0x85), None);
        assert_eq!(CommandId::from_byte(0x00), None);
    }

    #[test]
    fn test_command_encode_matches_packet_metadata() {
        let commands = [
            Command::SetPosition {
                channel: 1,
                position: 6000,
            },
            Command::SetSpeed {
                channel: 1,
                speed: 20,
            },
            Command::SetAcceleration {
                channel: 1,
                acceleration: 4,
            },
            Command::GetPosition { channel: 1 },
            Command::GetMovingState,
        ];
        for cmd in commands {
            let packet = cmd.encode().unwrap();
            assert_eq!(packet.command_id(), cmd.id());
            assert_eq!(packet.as_bytes().len(), cmd.id().frame_len());
            assert_eq!(packet.response_len(), cmd.id().response_len());
        }
    }

    #[test]
    fn test_command_encode_rejects_wide_values() {
        let cmd = Command::SetSpeed {
            channel: 0,
            speed: 0x4000,
        };
        assert!(cmd.encode().is_err());
    }
}
