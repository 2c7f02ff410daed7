use std::env;
use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt as tracing_fmt};

// Import CRATE_NAMES, which lists all crates in the workspace.
include!(concat!(env!("OUT_DIR"), "/constants.gen.rs"));

/// Controls the log format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    Auto,

    /// Pretty printing with colors.
    ///
    /// ```text
    ///   INFO  flowsim::setup: simulating 5000 events
    /// ```
    Pretty,

    /// Simplified plain text output.
    ///
    /// ```text
    /// 2026-10-19T12:10:32.000000Z  INFO flowsim::setup: simulating 5000 events
    /// ```
    Simplified,

    /// Dump out JSON lines.
    ///
    /// ```text
    /// {"timestamp":"2026-10-19T12:11:08.729716Z","level":"INFO","message":"simulating 5000 events","target":"flowsim::setup","filename":"flowsim/src/setup.rs","line_number":31}
    /// ```
    Json,
}

/// The maximum level of log messages emitted by the workspace crates.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Disables logging.
    Off,
    /// Only errors.
    Error,
    /// Warnings and above.
    Warn,
    /// Informational messages and above.
    Info,
    /// Debug messages and above.
    Debug,
    /// Everything, including per-event traces.
    Trace,
}

impl LogLevel {
    /// Returns the tracing level filter corresponding to this level.
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.level_filter(), f)
    }
}

/// Controls the logging system.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// The log level for all workspace crates.
    pub level: LogLevel,

    /// Controls the log output format.
    ///
    /// Defaults to [`LogFormat::Auto`], which detects the best format based on the TTY.
    pub format: LogFormat,

    /// When set to `true`, backtraces are forced on.
    ///
    /// Otherwise, backtraces can be enabled by setting the `RUST_BACKTRACE` variable to `full`.
    pub enable_backtraces: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Auto,
            enable_backtraces: false,
        }
    }
}

/// Configures the given log level for all of the workspace crates.
///
/// Third-party crates log at INFO.
fn default_filters(level: LevelFilter) -> EnvFilter {
    let mut env_filter = EnvFilter::new("INFO");

    for name in CRATE_NAMES {
        if let Ok(directive) = format!("{name}={level}").parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    env_filter
}

/// Initialize the logging system.
///
/// The `RUST_LOG` environment variable takes precedence over the configured level. Calling this
/// more than once has no effect.
///
/// # Example
///
/// ```
/// let log_config = flowsim_log::LogConfig {
///     enable_backtraces: true,
///     ..Default::default()
/// };
///
/// flowsim_log::init(&log_config);
/// ```
pub fn init(config: &LogConfig) {
    if config.enable_backtraces {
        // SAFETY: Logging is initialized once during startup before any threads are spawned.
        unsafe { env::set_var("RUST_BACKTRACE", "full") };
    }

    // Standard output is reserved for command results.
    let format: Box<dyn Layer<Registry> + Send + Sync> =
        match (config.format, console::user_attended()) {
            (LogFormat::Auto, true) | (LogFormat::Pretty, _) => tracing_fmt::layer()
                .with_writer(io::stderr)
                .pretty()
                .with_target(true)
                .boxed(),
            (LogFormat::Auto, false) | (LogFormat::Simplified, _) => tracing_fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false)
                .with_target(true)
                .boxed(),
            (LogFormat::Json, _) => tracing_fmt::layer()
                .with_writer(io::stderr)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filters(config.level.level_filter()));

    tracing_subscriber::registry()
        .with(format.with_filter(filter))
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config: LogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Auto);
        assert!(!config.enable_backtraces);
    }

    #[test]
    fn test_parse_config() {
        let config: LogConfig =
            serde_json::from_str(r#"{"level":"trace","format":"json"}"#).unwrap();
        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Off.to_string(), "off");
    }

    #[test]
    fn test_default_filters_include_workspace() {
        assert!(CRATE_NAMES.contains(&"flowsim_log"));
        let filter = default_filters(LevelFilter::DEBUG).to_string();
        assert!(filter.contains("flowsim_log=debug"));
    }
}
