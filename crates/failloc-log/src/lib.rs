//! A minimal, zero-dependency logger for the `failloc` allocation layer.
//!
//! Diagnostics go to standard error so that they never interleave with a
//! program's regular output. Every record carries the module path of the
//! call site as its target.
//!
//! The level is a single process-wide atomic. It starts at [`Level::Warn`]
//! and can be raised or lowered at runtime with [`set_level`], or read once
//! from the `FAILLOC_LOG` environment variable with [`init_from_env`].
//!
//! # Example
//!
//! ```
//! use failloc_log::{error, warn, info, debug, Level};
//!
//! failloc_log::set_level(Level::Debug);
//!
//! let bytes = 4096;
//! info!("reserved {} bytes", bytes);
//! debug!("fragments: {:?}", ["a", "b"]);
//! warn!("environment list truncated");
//! error!("allocation failed");
//! ```

use std::fmt::Arguments;
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Environment variable consulted by [`init_from_env`].
pub const LEVEL_ENV: &str = "FAILLOC_LOG";

/// Severity of a log record, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Unrecoverable conditions; the fatal handler logs here.
    Error = 0,
    /// Degraded but continuing (partial results, sentinels).
    Warn = 1,
    /// Coarse lifecycle events.
    Info = 2,
    /// Allocation sizes and decisions.
    Debug = 3,
    /// Enter/leave hook traffic.
    Trace = 4,
}

impl Level {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }

    const fn color_code(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Upper-case name of the level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }
}

/// Error returned when a level name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    input: String,
}

impl std::fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid log level: {:?}", self.input)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name, ignoring case and surrounding whitespace.
    ///
    /// ```
    /// use failloc_log::Level;
    ///
    /// assert_eq!("error".parse::<Level>(), Ok(Level::Error));
    /// assert_eq!(" Info ".parse::<Level>(), Ok(Level::Info));
    /// assert!("loud".parse::<Level>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Level::Error),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "INFO" => Ok(Level::Info),
            "DEBUG" => Ok(Level::Debug),
            "TRACE" => Ok(Level::Trace),
            _ => Err(ParseLevelError {
                input: s.to_string(),
            }),
        }
    }
}

/// Process-wide logger state.
pub struct Logger {
    level: AtomicU8,
    color: AtomicBool,
}

impl Logger {
    const fn new(level: Level, color: bool) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
            color: AtomicBool::new(color),
        }
    }

    /// Sets the most verbose level that will still be emitted.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Current level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Whether a record at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }

    /// Turns ANSI colouring on or off.
    pub fn set_color(&self, on: bool) {
        self.color.store(on, Ordering::Relaxed);
    }

    fn color(&self) -> bool {
        self.color.load(Ordering::Relaxed)
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the global logger, creating it at [`Level::Warn`] on first use.
///
/// Colour is disabled when `NO_COLOR` is present in the environment.
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(Level::Warn, std::env::var_os("NO_COLOR").is_none()))
}

/// Sets the global level.
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Sets the global level from a level name.
///
/// ```
/// failloc_log::set_level_from_str("debug").unwrap();
/// assert_eq!(failloc_log::get_logger().level(), failloc_log::Level::Debug);
/// ```
pub fn set_level_from_str(s: &str) -> Result<(), ParseLevelError> {
    set_level(s.parse()?);
    Ok(())
}

/// Reads [`LEVEL_ENV`] and applies it.
///
/// Returns the level that is in effect afterwards. An unset variable keeps
/// the current level; an unparsable one is reported on stderr and ignored.
pub fn init_from_env() -> Level {
    let logger = get_logger();
    if let Some(raw) = std::env::var_os(LEVEL_ENV) {
        match raw.to_string_lossy().parse::<Level>() {
            Ok(level) => logger.set_level(level),
            Err(e) => {
                __log_with_target(Level::Warn, module_path!(), format_args!("{LEVEL_ENV}: {e}"));
            }
        }
    }
    logger.level()
}

/// Writes one record. Called by the macros after the level check.
#[doc(hidden)]
pub fn __log_with_target(level: Level, target: &str, args: Arguments) {
    const RESET: &str = "\x1b[0m";

    let logger = get_logger();
    if !logger.enabled(level) {
        return;
    }

    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    // A failed diagnostic write has nowhere else to go.
    let _ = if logger.color() {
        writeln!(out, "{}[{}]{RESET} {target}: {args}", level.color_code(), level.as_str())
    } else {
        writeln!(out, "[{}] {target}: {args}", level.as_str())
    };
}

/// Logs at an explicit level.
///
/// ```
/// use failloc_log::{log, Level};
///
/// log!(level: Level::Info, "grew table to {} slots", 8);
/// ```
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {
        {
            if $crate::get_logger().enabled($level) {
                $crate::__log_with_target(
                    $level,
                    module_path!(),
                    format_args!($($arg)*)
                );
            }
        }
    };
}

/// Logs at [`Level::Error`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Error, $($arg)*)
    };
}

/// Logs at [`Level::Warn`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Warn, $($arg)*)
    };
}

/// Logs at [`Level::Info`].
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Info, $($arg)*)
    };
}

/// Logs at [`Level::Debug`].
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Debug, $($arg)*)
    };
}

/// Logs at [`Level::Trace`].
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Trace, $($arg)*)
    };
}
