//! maestro-io - Bring up the servos of a Pololu Maestro from a config file
//!
//! Opens the controller, applies the configured speed and acceleration limits
//! and reports every servo's calibration and current position. With
//! `--center` every servo is then driven to neutral and the tool waits for
//! the controller to report that motion has settled.

use maestro_io::config::AppConfig;
use maestro_io::error::{Error, Result};
use maestro_io::{Channel, MotionServo, PositionServo};
use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How long `--center` waits for the servos to settle
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Slice of the settle wait between Ctrl-C checks
const SETTLE_SLICE: Duration = Duration::from_millis(200);

const SETTLE_POLL: Duration = Duration::from_millis(20);

/// Parse config path from command line arguments.
///
/// Supports:
/// - `maestro-io <path>` (positional)
/// - `maestro-io --config <path>` (flag-based)
/// - `maestro-io -c <path>` (short flag)
///
/// Defaults to `/etc/maestro-io.toml` if not specified.
fn parse_config_path(args: &[String]) -> String {
    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to the first positional argument
    if let Some(path) = args.iter().skip(1).find(|arg| !arg.starts_with('-')) {
        return path.clone();
    }

    "/etc/maestro-io.toml".to_string()
}

/// Initialize logger; RUST_LOG overrides `level`
fn init_logger(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

/// Load the config and start logging at its level
///
/// A config that cannot be loaded is still logged, at the default level.
fn load_config(path: &str) -> Result<AppConfig> {
    match AppConfig::from_file(path) {
        Ok(config) => {
            init_logger(&config.logging.level);
            Ok(config)
        }
        Err(e) => {
            init_logger("info");
            log::error!("Failed to load config {}: {}", path, e);
            Err(e)
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let center = args.iter().any(|arg| arg == "--center");

    let config_path = parse_config_path(&args);
    let config = load_config(&config_path)?;

    log::info!("maestro-io v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", config_path);
    if let Err(e) = config.validate() {
        log::error!("Invalid config {}: {}", config_path, e);
        return Err(e);
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let mut connection = config.build_connection()?;
    connection.open()?;
    let connection = connection.into_shared();

    let mut servos = Vec::with_capacity(config.servos.len());
    for servo_config in &config.servos {
        let servo = Channel::from_config(servo_config, &connection)?;
        if let Some(speed) = servo_config.speed {
            servo.set_speed(speed)?;
        }
        if let Some(acceleration) = servo_config.acceleration {
            servo.set_acceleration(acceleration)?;
        }

        let (min, neutral, max) = servo.calibration_summary();
        let (min_us, neutral_us, max_us) = servo.control_center_values();
        log::info!(
            "Servo '{}' ch{}: raw {}/{}/{} (min/neutral/max), {:.2}/{:.2}/{:.2} us",
            servo_config.name,
            servo.index(),
            min,
            neutral,
            max,
            min_us,
            neutral_us,
            max_us
        );
        match servo.get_position_degrees() {
            Ok(degrees) => log::info!("Servo '{}' at {} degrees", servo_config.name, degrees),
            Err(e) => log::warn!("Servo '{}': position unavailable: {}", servo_config.name, e),
        }
        servos.push(servo);
    }

    if center {
        for servo in &servos {
            servo.center()?;
        }
        log::info!("Centering {} servos...", servos.len());

        let start = Instant::now();
        loop {
            if !running.load(Ordering::Relaxed) {
                log::warn!("Centering aborted");
                break;
            }
            match connection.lock().wait_until_settled(SETTLE_SLICE, SETTLE_POLL) {
                Ok(()) => {
                    log::info!("All servos settled");
                    break;
                }
                Err(Error::Timeout { .. }) if start.elapsed() < SETTLE_TIMEOUT => {}
                Err(e) => return Err(e),
            }
        }
    }

    connection.lock().close();
    log::info!("maestro-io stopped");
    Ok(())
}
