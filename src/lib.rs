//! maestro-io - Serial driver for Pololu Maestro servo controllers
//!
//! A [`Connection`] owns the serial link to one controller. Any number of
//! [`Channel`]s share it and translate degrees or radians into calibrated,
//! range-checked position commands.
//!
//! ```no_run
//! use maestro_io::{Calibration, Channel, Connection, PositionServo};
//! use maestro_io::transport::SerialConnector;
//!
//! let mut conn = Connection::new("/dev/ttyACM0", 9600, SerialConnector::default());
//! conn.open()?;
//! let conn = conn.into_shared();
//!
//! let base = Channel::new(0, Calibration::new(6000, 3600)?, &conn)?;
//! base.set_position_degrees(45)?;
//! # Ok::<(), maestro_io::Error>(())
//! ```
//!
//! ## Features
//!
//! - `mock`: Enable the simulated controller transport for hardware-free runs

pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod servo;
pub mod transport;

// Re-export commonly used types
pub use config::AppConfig;
pub use connection::{Connection, ConnectionState, SharedConnection};
pub use error::{Error, Result};
pub use servo::{Calibration, Channel, MotionServo, PositionServo};
