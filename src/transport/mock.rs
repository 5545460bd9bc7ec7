//! Mock transport for testing
//!
//! [`MockConnector`] and every [`MockTransport`] it opens share one in-memory
//! bus, so a test can keep a clone of the connector and inspect the traffic
//! after the connector has been moved into a `Connection`.
//!
//! In simulated mode the bus behaves like a controller: set-position frames
//! update a per-channel target, get-position frames answer with that target
//! and get-moving-state frames answer with the configured moving flag.

use super::{Connector, Transport, TransportError, TransportResult};
use crate::protocol::CommandId;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Mock connector for unit testing
#[derive(Clone, Default)]
pub struct MockConnector {
    bus: Arc<Mutex<MockBus>>,
}

#[derive(Default)]
struct MockBus {
    read_buffer: VecDeque<u8>,
    /// Replies released into `read_buffer`, one per write
    replies: VecDeque<Vec<u8>>,
    write_buffer: Vec<u8>,
    /// Bytes written but not yet parsed as a complete frame
    pending: Vec<u8>,
    open_handles: usize,
    connect_calls: usize,
    io_calls: usize,
    last_target: Option<(String, u32)>,
    fail_connect: bool,
    fail_writes: bool,
    fail_reads: bool,
    simulate: bool,
    moving: bool,
    targets: HashMap<u8, u16>,
}

impl MockConnector {
    /// Create a new mock connector with an inert bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock connector whose bus answers like a controller
    pub fn simulated() -> Self {
        let connector = Self::default();
        connector.bus.lock().simulate = true;
        connector
    }

    /// Inject data that is already waiting in the input buffer
    pub fn inject_read(&self, data: &[u8]) {
        self.bus.lock().read_buffer.extend(data);
    }

    /// Queue a reply that arrives once the next command has been written
    pub fn queue_reply(&self, data: &[u8]) {
        self.bus.lock().replies.push_back(data.to_vec());
    }

    /// Bytes waiting in the input buffer
    pub fn pending_input(&self) -> usize {
        self.bus.lock().read_buffer.len()
    }

    /// Get all written data
    pub fn written(&self) -> Vec<u8> {
        self.bus.lock().write_buffer.clone()
    }

    /// Clear written data
    pub fn clear_written(&self) {
        self.bus.lock().write_buffer.clear();
    }

    /// Number of transport handles currently alive
    pub fn open_handles(&self) -> usize {
        self.bus.lock().open_handles
    }

    /// Number of `connect` calls made, successful or not
    pub fn connect_calls(&self) -> usize {
        self.bus.lock().connect_calls
    }

    /// Number of read/write/flush calls made on any handle
    pub fn io_calls(&self) -> usize {
        self.bus.lock().io_calls
    }

    /// Name and baud rate of the last `connect` call
    pub fn last_target(&self) -> Option<(String, u32)> {
        self.bus.lock().last_target.clone()
    }

    /// Make subsequent `connect` calls fail
    pub fn set_fail_connect(&self, fail: bool) {
        self.bus.lock().fail_connect = fail;
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.bus.lock().fail_writes = fail;
    }

    /// Make subsequent reads fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.bus.lock().fail_reads = fail;
    }

    /// Moving flag reported by the simulated controller
    pub fn set_moving(&self, moving: bool) {
        self.bus.lock().moving = moving;
    }

    /// Position the simulated controller reports for `channel`
    pub fn set_target(&self, channel: u8, position: u16) {
        self.bus.lock().targets.insert(channel, position);
    }

    /// Last position commanded on `channel`, as seen by the simulated controller
    pub fn target(&self, channel: u8) -> Option<u16> {
        self.bus.lock().targets.get(&channel).copied()
    }
}

impl Connector for MockConnector {
    fn connect(&self, name: &str, baud_rate: u32) -> TransportResult<Box<dyn Transport>> {
        let mut bus = self.bus.lock();
        bus.connect_calls += 1;
        bus.last_target = Some((name.to_string(), baud_rate));
        if bus.fail_connect {
            return Err(TransportError::Unavailable(format!("no device at {}", name)));
        }
        bus.open_handles += 1;
        Ok(Box::new(MockTransport {
            bus: Arc::clone(&self.bus),
        }))
    }
}

/// Mock transport handle opened by [`MockConnector`]
pub struct MockTransport {
    bus: Arc<Mutex<MockBus>>,
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> TransportResult<usize> {
        let mut bus = self.bus.lock();
        bus.io_calls += 1;
        if bus.fail_reads {
            return Err(TransportError::Unavailable("read rejected".to_string()));
        }
        let available = bus.read_buffer.len().min(buffer.len());
        for (slot, byte) in buffer.iter_mut().zip(bus.read_buffer.drain(..available)) {
            *slot = byte;
        }
        Ok(available)
    }

    fn write(&mut self, data: &[u8]) -> TransportResult<usize> {
        let mut bus = self.bus.lock();
        bus.io_calls += 1;
        if bus.fail_writes {
            return Err(TransportError::Unavailable("write rejected".to_string()));
        }
        bus.write_buffer.extend_from_slice(data);
        if let Some(reply) = bus.replies.pop_front() {
            bus.read_buffer.extend(reply);
        }
        if bus.simulate {
            bus.pending.extend_from_slice(data);
            bus.process_frames();
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> TransportResult<()> {
        self.bus.lock().io_calls += 1;
        Ok(())
    }

    fn discard_input(&mut self) -> TransportResult<()> {
        let mut bus = self.bus.lock();
        bus.io_calls += 1;
        bus.read_buffer.clear();
        Ok(())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        let mut bus = self.bus.lock();
        bus.open_handles = bus.open_handles.saturating_sub(1);
    }
}

impl MockBus {
    /// Consume every complete frame in `pending` and queue the replies
    fn process_frames(&mut self) {
        loop {
            let Some(&opcode) = self.pending.first() else {
                return;
            };
            let frame_len = match CommandId::from_byte(opcode) {
                Some(id) => id.frame_len(),
                None => {
                    // Not a command byte, resynchronize on the next one
                    self.pending.remove(0);
                    continue;
                }
            };
            if self.pending.len() < frame_len {
                return;
            }
            let frame: Vec<u8> = self.pending.drain(..frame_len).collect();
            match CommandId::from_byte(opcode) {
                Some(CommandId::SetPosition) => {
                    let position = u16::from(frame[2]) | (u16::from(frame[3]) << 7);
                    self.targets.insert(frame[1], position);
                }
                Some(CommandId::GetPosition) => {
                    let position = self.targets.get(&frame[1]).copied().unwrap_or(0);
                    self.read_buffer.extend(position.to_le_bytes());
                }
                Some(CommandId::GetMovingState) => {
                    self.read_buffer.push_back(u8::from(self.moving));
                }
                _ => {}
            }
        }
    }
}
