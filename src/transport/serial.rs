//! Serial transport implementation

use super::{Connector, Transport, TransportResult};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Default read timeout; responses are at most two bytes
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial transport for the Maestro command port
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyACM0", "COM3")
    /// * `baud_rate` - Baud rate (e.g., 9600)
    /// * `timeout` - Per-read timeout before a read reports zero bytes
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> TransportResult<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()?;

        log::info!("Opened serial port: {} at {} baud", path, baud_rate);

        // Drop anything the controller sent before we were listening
        if let Err(e) = port.clear(serialport::ClearBuffer::All) {
            log::warn!("Could not clear serial buffers on {}: {}", path, e);
        }

        Ok(SerialTransport { port })
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buffer: &mut [u8]) -> TransportResult<usize> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> TransportResult<usize> {
        Ok(self.port.write(data)?)
    }

    fn flush(&mut self) -> TransportResult<()> {
        self.port.flush()?;
        Ok(())
    }

    fn discard_input(&mut self) -> TransportResult<()> {
        self.port.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        log::debug!(
            "Closing serial port {}",
            self.port.name().unwrap_or_else(|| "<unnamed>".to_string())
        );
    }
}

/// Opens [`SerialTransport`] handles
#[derive(Debug, Clone)]
pub struct SerialConnector {
    timeout: Duration,
}

impl SerialConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SerialConnector {
    fn default() -> Self {
        Self::new(DEFAULT_READ_TIMEOUT)
    }
}

impl Connector for SerialConnector {
    fn connect(&self, name: &str, baud_rate: u32) -> TransportResult<Box<dyn Transport>> {
        Ok(Box::new(SerialTransport::open(name, baud_rate, self.timeout)?))
    }
}
