//! Configuration for the maestro-io application
//!
//! Loads the controller link and the servo calibrations from a TOML file.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::protocol::MAX_CHANNEL;
use crate::servo::{Calibration, DEFAULT_MAX_DEGREES, DEFAULT_MIN_DEGREES, MAX_MOTION_LIMIT};
use crate::transport::SerialConnector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub controller: ControllerConfig,
    #[serde(default)]
    pub servos: Vec<ServoConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Link to the controller
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Serial device, e.g. `/dev/ttyACM0` or `COM3`
    pub port: String,
    pub baud_rate: u32,
    #[serde(default)]
    pub transport: TransportKind,
    /// Serial read timeout; a silent controller yields a short read after this
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Which transport backs the connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Serial,
    /// In-memory simulated controller (`mock` feature)
    Mock,
}

/// One servo channel
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServoConfig {
    pub name: String,
    /// 0-based channel index on the controller
    pub channel: u16,
    /// Neutral position in quarter-microseconds
    pub neutral: u16,
    /// Allowed travel to either side of neutral, in quarter-microseconds
    pub delta: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_degrees: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_degrees: Option<i32>,
    /// Speed limit applied at startup, 0 = unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<u16>,
    /// Acceleration limit applied at startup, 0 = unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<u16>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error); `RUST_LOG` wins
    pub level: String,
}

fn default_read_timeout_ms() -> u64 {
    100
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServoConfig {
    /// Calibration described by this entry
    pub fn calibration(&self) -> Result<Calibration> {
        Calibration::new(self.neutral, self.delta)?.with_degree_limits(
            self.min_degrees.unwrap_or(DEFAULT_MIN_DEGREES),
            self.max_degrees.unwrap_or(DEFAULT_MAX_DEGREES),
        )
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use maestro_io::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("maestro-io.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Single standard servo on channel 0 of `/dev/ttyACM0` at 9600 baud
    pub fn defaults() -> Self {
        Self {
            controller: ControllerConfig {
                port: "/dev/ttyACM0".to_string(),
                baud_rate: 9600,
                transport: TransportKind::Serial,
                read_timeout_ms: default_read_timeout_ms(),
            },
            servos: vec![ServoConfig {
                name: "base".to_string(),
                channel: 0,
                neutral: 6000,
                delta: 3600,
                min_degrees: None,
                max_degrees: None,
                speed: None,
                acceleration: None,
            }],
            logging: LoggingConfig::default(),
        }
    }

    /// Check everything that would otherwise only fail at first use
    pub fn validate(&self) -> Result<()> {
        if self.controller.baud_rate == 0 {
            return Err(Error::Other("controller.baud_rate must be non-zero".to_string()));
        }

        let mut seen = HashSet::new();
        for servo in &self.servos {
            if servo.channel > u16::from(MAX_CHANNEL) {
                return Err(Error::Other(format!(
                    "servo '{}': channel {} exceeds {}",
                    servo.name, servo.channel, MAX_CHANNEL
                )));
            }
            if !seen.insert(servo.channel) {
                return Err(Error::Other(format!(
                    "servo '{}': channel {} is used more than once",
                    servo.name, servo.channel
                )));
            }
            servo.calibration().map_err(|e| match e {
                Error::InvalidCalibration(reason) => {
                    Error::InvalidCalibration(format!("servo '{}': {}", servo.name, reason))
                }
                other => other,
            })?;
            for (quantity, limit) in [("speed", servo.speed), ("acceleration", servo.acceleration)] {
                if limit.is_some_and(|v| v > MAX_MOTION_LIMIT) {
                    return Err(Error::Other(format!(
                        "servo '{}': {} must be 0..={}",
                        servo.name, quantity, MAX_MOTION_LIMIT
                    )));
                }
            }
        }
        Ok(())
    }

    /// Closed connection for the configured controller
    pub fn build_connection(&self) -> Result<Connection> {
        let controller = &self.controller;
        match controller.transport {
            TransportKind::Serial => {
                let connector =
                    SerialConnector::new(Duration::from_millis(controller.read_timeout_ms));
                Ok(Connection::new(
                    &controller.port,
                    controller.baud_rate,
                    connector,
                ))
            }
            #[cfg(any(test, feature = "mock"))]
            TransportKind::Mock => Ok(Connection::new(
                &controller.port,
                controller.baud_rate,
                crate::transport::mock::MockConnector::simulated(),
            )),
            #[cfg(not(any(test, feature = "mock")))]
            TransportKind::Mock => Err(Error::Other(
                "mock transport requires the `mock` feature".to_string(),
            )),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[controller]
port = "/dev/ttyACM1"
baud_rate = 115200
read_timeout_ms = 250

[[servos]]
name = "base"
channel = 0
neutral = 6000
delta = 3600

[[servos]]
name = "gripper"
channel = 5
neutral = 5000
delta = 1000
min_degrees = -20
max_degrees = 25
speed = 40
acceleration = 4

[logging]
level = "debug"
"#;

    #[test]
    fn test_default_config() {
        let config = AppConfig::defaults();
        assert_eq!(config.controller.port, "/dev/ttyACM0");
        assert_eq!(config.controller.baud_rate, 9600);
        assert_eq!(config.controller.transport, TransportKind::Serial);
        assert_eq!(config.controller.read_timeout_ms, 100);
        assert_eq!(config.servos.len(), 1);
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_toml_deserialization() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.controller.port, "/dev/ttyACM1");
        assert_eq!(config.controller.baud_rate, 115200);
        assert_eq!(config.controller.transport, TransportKind::Serial);
        assert_eq!(config.controller.read_timeout_ms, 250);
        assert_eq!(config.logging.level, "debug");

        let gripper = &config.servos[1];
        assert_eq!(gripper.speed, Some(40));
        assert_eq!(config.servos[0].speed, None);
        let cal = gripper.calibration().unwrap();
        assert_eq!(cal.summary(), (4000, 5000, 6000));
        assert_eq!((cal.min_degrees(), cal.max_degrees()), (-20, 25));
        config.validate().unwrap();
    }

    #[test]
    fn test_optional_sections() {
        let config: AppConfig = toml::from_str(
            r#"
[controller]
port = "COM3"
baud_rate = 9600
transport = "mock"
"#,
        )
        .unwrap();
        assert_eq!(config.controller.transport, TransportKind::Mock);
        assert_eq!(config.controller.read_timeout_ms, 100);
        assert!(config.servos.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[controller]"));
        assert!(toml_string.contains("[[servos]]"));
        assert!(toml_string.contains("[logging]"));
        assert!(toml_string.contains("port = \"/dev/ttyACM0\""));
        assert!(toml_string.contains("transport = \"serial\""));
        assert!(!toml_string.contains("min_degrees"));

        let parsed: AppConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.servos[0].neutral, 6000);
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("maestro-io-{}.toml", std::process::id()));
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        config.to_file(&path).unwrap();
        let loaded = AppConfig::from_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.servos.len(), 2);
        assert_eq!(loaded.servos[1].name, "gripper");
        assert_eq!(loaded.servos[1].max_degrees, Some(25));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::from_file("/nonexistent/maestro-io.toml"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::defaults();
        config.servos.push(config.servos[0].clone());
        assert!(config.validate().is_err());

        let mut config = AppConfig::defaults();
        config.servos[0].channel = 128;
        assert!(config.validate().is_err());

        let mut config = AppConfig::defaults();
        config.servos[0].delta = 6000;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidCalibration(_))
        ));

        let mut config = AppConfig::defaults();
        config.servos[0].speed = Some(256);
        assert!(config.validate().is_err());

        let mut config = AppConfig::defaults();
        config.servos[0].min_degrees = Some(30);
        config.servos[0].max_degrees = Some(-30);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_mock_connection() {
        let mut config = AppConfig::defaults();
        config.controller.transport = TransportKind::Mock;
        let mut conn = config.build_connection().unwrap();
        assert!(!conn.is_open());
        conn.open().unwrap();
        assert!(!conn.is_moving().unwrap());
    }
}
