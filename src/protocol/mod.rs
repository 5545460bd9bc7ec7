//! Maestro compact serial protocol
//!
//! Frame format: [CMD] [CHANNEL] [LO7] [HI7]
//!
//! 14-bit values are split into two 7-bit groups, low group first, so every
//! byte after the opcode has its top bit clear. Only the opcode has bit 7 set.
//!
//! | Command          | Bytes out            | Bytes in |
//! |------------------|----------------------|----------|
//! | Set position     | `0x84, ch, lo7, hi7` | 0        |
//! | Set speed        | `0x87, ch, lo7, hi7` | 0        |
//! | Set acceleration | `0x89, ch, lo7, hi7` | 0        |
//! | Get position     | `0x90, ch`           | 2 (LE)   |
//! | Get moving state | `0x93`               | 1        |
//!
//! Everything here is pure: no I/O, no state.

mod commands;
mod packet;

pub use commands::{Command, CommandId};
pub use packet::{
    Packet, decode_moving_state, decode_position, encode_get_moving_state, encode_get_position,
    encode_set_acceleration, encode_set_position, encode_set_speed,
};

/// Highest addressable channel (the channel field is one 7-bit byte)
pub const MAX_CHANNEL: u8 = 127;

/// Largest value a 14-bit field can carry
pub const MAX_14BIT: u16 = 0x3FFF;

/// Longest response any supported command produces
pub const MAX_RESPONSE_LEN: usize = 2;
