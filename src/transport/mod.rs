//! Transport layer for I/O abstraction
//!
//! A [`Connector`] opens a named link and hands back a [`Transport`] handle.
//! Closing the link is dropping the handle, so a handle can never outlive the
//! [`Connection`](crate::connection::Connection) that owns it.

mod serial;
pub use serial::{SerialConnector, SerialTransport};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// Errors raised by the byte link itself
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Link could not be used (device missing, injected failure, ...)
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Result type for transport operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Transport trait for an opened device link
pub trait Transport: Send {
    /// Read data into buffer, returns number of bytes read
    ///
    /// Returns `Ok(0)` when the read timed out with nothing available.
    fn read(&mut self, buffer: &mut [u8]) -> TransportResult<usize>;

    /// Write data from buffer, returns number of bytes written
    fn write(&mut self, data: &[u8]) -> TransportResult<usize>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> TransportResult<()>;

    /// Drop bytes already received but not yet read
    ///
    /// Late bytes from a timed-out reply would otherwise be taken as the
    /// start of the next reply.
    fn discard_input(&mut self) -> TransportResult<()>;

    /// Write the whole buffer, looping over short writes
    fn write_all(&mut self, mut data: &[u8]) -> TransportResult<()> {
        while !data.is_empty() {
            match self.write(data)? {
                0 => {
                    return Err(TransportError::Io(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "transport accepted no bytes",
                    )));
                }
                n => data = &data[n..],
            }
        }
        Ok(())
    }

    /// Fill `buffer` as far as possible, stopping at the first timed-out read
    ///
    /// Returns the number of bytes actually received.
    fn read_up_to(&mut self, buffer: &mut [u8]) -> TransportResult<usize> {
        let mut filled = 0;
        while filled < buffer.len() {
            match self.read(&mut buffer[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        Ok(filled)
    }
}

/// Opens transports by device name
pub trait Connector: Send {
    /// Open a link to `name` at `baud_rate`
    fn connect(&self, name: &str, baud_rate: u32) -> TransportResult<Box<dyn Transport>>;
}
