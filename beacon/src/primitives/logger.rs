use std::sync::{Arc, OnceLock};

/// Trait representing a logger that can receive log messages at various levels.
///
/// The host application implements this trait and installs it once via
/// [`set_logger`]; all SDK logging emitted through the `log` facade is then
/// forwarded to it.
///
/// # Examples
///
/// Implementing the `Logger` trait:
///
/// ```rust
/// use beacon::primitives::logger::{Logger, LogLevel};
///
/// struct MyLogger;
///
/// impl Logger for MyLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         println!("[{:?}] {}", level, message);
///     }
/// }
/// ```
///
/// ## Swift
///
/// ```swift
/// class BeaconLoggerBridge: Beacon.Logger {
///     static let shared = BeaconLoggerBridge()
///
///     func log(level: Beacon.LogLevel, message: String) {
///         Log.log(level, message)
///     }
/// }
///
/// // In the app delegate, call this only once:
/// Beacon.setLogger(logger: BeaconLoggerBridge.shared)
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs a message at the specified log level.
    fn log(&self, level: LogLevel, message: String);
}

/// Enumeration of possible log levels.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum LogLevel {
    /// Designates very low priority, often extremely detailed messages.
    Trace,
    /// Designates lower priority debugging information.
    Debug,
    /// Designates informational messages that highlight the progress of the application.
    Info,
    /// Designates potentially harmful situations.
    Warn,
    /// Designates error events that might still allow the application to continue running.
    Error,
}

/// A `log::Log` implementation that forwards records to the host-provided [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        // Debug and trace records from dependencies are dropped; only the
        // SDK's own low-level records are forwarded to the host.
        let is_record_from_beacon = record
            .module_path()
            .is_some_and(|module_path| module_path.starts_with("beacon"));

        let is_debug_or_trace_level =
            record.level() == log::Level::Debug || record.level() == log::Level::Trace;

        if is_debug_or_trace_level && !is_record_from_beacon {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            let level = log_level(record.level());
            let message = format!("{}", record.args());
            logger.log(level, message);
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Converts a `log::Level` to a [`LogLevel`].
const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

/// The host-provided logger, installed once by [`set_logger`].
static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Sets the global logger.
///
/// Installs the host implementation and initializes the `log` facade. Should
/// be called once before any other SDK operation so early records are not lost.
/// Repeated calls are ignored.
#[allow(clippy::module_name_repetitions)]
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    match LOGGER_INSTANCE.set(logger) {
        Ok(()) => {
            if init_logger().is_err() {
                // The facade is already claimed, e.g. by a test harness.
                log::warn!("log facade already initialized, reusing it");
            }
        }
        Err(_) => println!("Logger already set"),
    }
}

/// Initializes the `log` facade with the [`ForeignLogger`] bridge.
///
/// # Errors
///
/// Returns a `log::SetLoggerError` if a logger was already installed.
fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
