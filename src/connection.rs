//! Connection lifecycle for one Maestro controller
//!
//! States: `Closed` (initial) and `Open`. Commands are only issued while
//! `Open`; a closed connection refuses them without touching the transport.
//!
//! ```text
//!            open() ok
//!   Closed ─────────────▶ Open ──┐ open(): close, then reopen
//!     ▲  ▲                 │ ◀──┘
//!     │  └──── close() ────┘
//!     └── reinitialize(name, baud) from either state
//! ```

use crate::error::{Error, Result};
use crate::protocol::{
    CommandId, MAX_RESPONSE_LEN, Packet, decode_moving_state, encode_get_moving_state,
};
use crate::transport::{Connector, Transport, TransportError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Connection shared between the owner and any number of channels
///
/// The owner keeps the only strong reference; channels hold `Weak` handles.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
}

/// Serial connection to a Maestro controller
pub struct Connection {
    port_name: String,
    baud_rate: u32,
    connector: Box<dyn Connector>,
    /// `Some` exactly while the connection is open
    transport: Option<Box<dyn Transport>>,
}

impl Connection {
    /// Create a closed connection; call [`open`](Self::open) before issuing commands
    pub fn new<C: Connector + 'static>(port_name: &str, baud_rate: u32, connector: C) -> Self {
        Self {
            port_name: port_name.to_string(),
            baud_rate,
            connector: Box::new(connector),
            transport: None,
        }
    }

    /// Wrap into a [`SharedConnection`]
    pub fn into_shared(self) -> SharedConnection {
        Arc::new(Mutex::new(self))
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn state(&self) -> ConnectionState {
        if self.transport.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Open the link
    ///
    /// An already open link is closed first, so at most one handle is alive.
    /// On failure the connection stays closed.
    pub fn open(&mut self) -> Result<()> {
        self.close();

        log::info!(
            "Maestro: Opening {} at {} baud",
            self.port_name,
            self.baud_rate
        );
        let transport = self
            .connector
            .connect(&self.port_name, self.baud_rate)
            .map_err(|source| Error::TransportFailure {
                operation: "open",
                channel: None,
                source,
            })?;
        self.transport = Some(transport);
        Ok(())
    }

    /// Close the link; closing a closed connection is a no-op
    pub fn close(&mut self) {
        match self.transport.take() {
            Some(transport) => {
                drop(transport);
                log::info!("Maestro: Closed {}", self.port_name);
            }
            None => log::debug!("Maestro: {} already closed", self.port_name),
        }
    }

    /// Point the connection at another device
    ///
    /// Always leaves the connection closed; call [`open`](Self::open) afterwards.
    pub fn reinitialize(&mut self, port_name: &str, baud_rate: u32) {
        self.close();
        log::info!(
            "Maestro: Reinitialized {} -> {} at {} baud",
            self.port_name,
            port_name,
            baud_rate
        );
        self.port_name = port_name.to_string();
        self.baud_rate = baud_rate;
    }

    /// Send a packet and read its declared response
    pub fn transact(&mut self, packet: &Packet) -> Result<Vec<u8>> {
        let id = packet.command_id();
        self.exchange(
            packet.as_bytes(),
            packet.response_len(),
            id.name(),
            packet.channel(),
        )
    }

    /// Send arbitrary command bytes and read exactly `expected_len` bytes back
    pub fn transact_raw(&mut self, command: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let operation = command
            .first()
            .and_then(|&b| CommandId::from_byte(b))
            .map_or("raw", CommandId::name);
        let channel = if command.len() >= 2 {
            Some(command[1])
        } else {
            None
        };
        self.exchange(command, expected_len, operation, channel)
    }

    /// Ask the controller whether any channel is still moving
    pub fn is_moving(&mut self) -> Result<bool> {
        let response = self.transact(&encode_get_moving_state())?;
        Ok(decode_moving_state([response[0]]))
    }

    /// Poll the moving state until the controller reports idle
    ///
    /// Holds `&mut self` for the whole wait; through a [`SharedConnection`]
    /// that blocks every other user of the link until this returns.
    pub fn wait_until_settled(&mut self, timeout: Duration, poll_interval: Duration) -> Result<()> {
        let start = Instant::now();
        loop {
            if !self.is_moving()? {
                log::debug!("Maestro: Settled after {:?}", start.elapsed());
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(Error::Timeout {
                    operation: "wait_until_settled",
                    waited: start.elapsed(),
                });
            }
            thread::sleep(poll_interval);
        }
    }

    fn exchange(
        &mut self,
        command: &[u8],
        expected_len: usize,
        operation: &'static str,
        channel: Option<u8>,
    ) -> Result<Vec<u8>> {
        if expected_len > MAX_RESPONSE_LEN {
            return Err(Error::out_of_range(
                "response length",
                expected_len as i64,
                0,
                MAX_RESPONSE_LEN as i64,
            ));
        }
        let Some(transport) = self.transport.as_mut() else {
            return Err(Error::NotConnected { operation });
        };

        let failure = |source: TransportError| Error::TransportFailure {
            operation,
            channel,
            source,
        };

        if expected_len > 0 {
            transport.discard_input().map_err(failure)?;
        }

        log::debug!(
            "Maestro: TX {} {} bytes: {:02X?}",
            operation,
            command.len(),
            command
        );
        transport.write_all(command).map_err(failure)?;
        transport.flush().map_err(failure)?;

        if expected_len == 0 {
            return Ok(Vec::new());
        }

        let mut response = [0u8; MAX_RESPONSE_LEN];
        let received = transport
            .read_up_to(&mut response[..expected_len])
            .map_err(failure)?;
        log::debug!(
            "Maestro: RX {} {} bytes: {:02X?}",
            operation,
            received,
            &response[..received]
        );
        if received != expected_len {
            return Err(Error::MalformedResponse {
                operation,
                channel,
                expected: expected_len,
                actual: received,
            });
        }
        Ok(response[..expected_len].to_vec())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
