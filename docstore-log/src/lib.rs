//! Docstore Logging
//!
//! Environment-driven logging setup for the docstore crates, built on
//! `tracing` and `tracing-subscriber`.
//!
//! # Usage
//!
//! ```rust
//! use docstore_log::{debug, info, warn, error, trace};
//!
//! docstore_log::init();
//!
//! debug!("Sending request");
//! info!("Connected to {}", "http://127.0.0.1:9200");
//! warn!("Creation was not acknowledged");
//! error!("Transport failure");
//!
//! let path = "/twitter/_search";
//! debug!(target: "docstore::wire", "POST {}", path);
//! ```
//!
//! # Environment Variables
//!
//! - `DOCSTORE_DEBUG=1` - Enable debug logging
//! - `DOCSTORE_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `DOCSTORE_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `DOCSTORE_LOG_COLOR=1|0` - Enable/disable colors
//! - `DOCSTORE_LOG_TIMESTAMPS=1|0` - Include timestamps
//! - `DOCSTORE_LOG_MODULE=1|0` - Include the module path of each event
//!
//! `RUST_LOG`, when set, overrides the level with full filter directives.

use once_cell::sync::{Lazy, OnceCell};
use std::env;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter::Directive, fmt, layer::SubscriberExt,
    registry::LookupSpan, reload, util::SubscriberInitExt,
};

pub use tracing::{debug, error, info, trace, warn};
pub use tracing_subscriber::util::TryInitError;

// ============================================================================
// Log Levels
// ============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    /// Trace level (most verbose)
    Trace = 0,
    /// Debug level
    Debug = 1,
    /// Info level
    Info = 2,
    /// Warning level
    Warn = 3,
    /// Error level (least verbose)
    Error = 4,
    /// Off (no logging)
    Off = 5,
}

impl Level {
    /// Parse a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Get level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    /// Filter directive for this level.
    pub fn directive(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line, human-oriented
    Pretty,
    /// Single line per event
    Compact,
    /// One JSON object per event
    Json,
}

impl Format {
    /// Parse a format name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

static RELOAD: OnceCell<reload::Handle<EnvFilter, Registry>> = OnceCell::new();

/// `RUST_LOG` as installed by `try_init`; its per-target directives survive
/// `set_level`.
static OVERRIDES: OnceCell<String> = OnceCell::new();

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether debug mode is enabled
    pub debug: bool,
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether colors are enabled
    pub color: bool,
    /// Whether to include timestamps
    pub timestamps: bool,
    /// Whether to include module path
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Compact,
            color: false,
            timestamps: true,
            module_path: true,
        }
    }
}

impl LogConfig {
    /// Read configuration from `DOCSTORE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        let debug = flag("DOCSTORE_DEBUG").unwrap_or(false);

        let level = lookup("DOCSTORE_LOG_LEVEL")
            .and_then(|s| Level::parse(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = lookup("DOCSTORE_LOG_FORMAT")
            .and_then(|s| Format::parse(&s))
            .unwrap_or(Format::Compact);

        let color = flag("DOCSTORE_LOG_COLOR")
            .unwrap_or_else(|| lookup("NO_COLOR").is_none() && lookup("TERM").is_some());

        Self {
            debug,
            level,
            format,
            // JSON output never carries escape codes.
            color: color && format != Format::Json,
            timestamps: flag("DOCSTORE_LOG_TIMESTAMPS").unwrap_or(true),
            module_path: flag("DOCSTORE_LOG_MODULE").unwrap_or(true),
        }
    }

    /// Set the minimum level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        if format == Format::Json {
            self.color = false;
        }
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.directive()))
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Install the global subscriber using the environment configuration.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init() {
    let _ = try_init(config().clone());
}

/// Install the global subscriber with an explicit configuration.
///
/// Fails if a global subscriber is already installed.
pub fn try_init(config: LogConfig) -> Result<(), TryInitError> {
    let (filter, handle) = reload::Layer::new(config.filter());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(&config))
        .try_init()?;

    LOG_LEVEL.store(config.level as u8, Ordering::SeqCst);
    if let Ok(directives) = env::var(EnvFilter::DEFAULT_ENV) {
        let _ = OVERRIDES.set(directives);
    }
    let _ = RELOAD.set(handle);
    Ok(())
}

fn fmt_layer<S>(config: &LogConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.color)
        .with_target(config.module_path);

    match (config.format, config.timestamps) {
        (Format::Pretty, true) => base.pretty().boxed(),
        (Format::Pretty, false) => base.pretty().without_time().boxed(),
        (Format::Compact, true) => base.compact().boxed(),
        (Format::Compact, false) => base.compact().without_time().boxed(),
        (Format::Json, true) => base.json().boxed(),
        (Format::Json, false) => base.json().without_time().boxed(),
    }
}

/// Get the process-wide environment configuration.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

/// Get current log level.
pub fn current_level() -> Level {
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Change the level of the installed subscriber at runtime.
///
/// Replaces the global level only. Per-target directives from `RUST_LOG`
/// stay in force; a bare level in `RUST_LOG` is superseded.
pub fn set_level(level: Level) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
    if let Some(handle) = RELOAD.get() {
        let _ = handle.reload(level_filter(level, OVERRIDES.get().map(String::as_str)));
    }
}

fn level_filter(level: Level, overrides: Option<&str>) -> EnvFilter {
    let mut filter = EnvFilter::new(level.directive());
    for raw in overrides.unwrap_or_default().split(',').map(str::trim) {
        if raw.is_empty() || Level::parse(raw).is_some() {
            continue;
        }
        match raw.parse::<Directive>() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => warn!("Dropping log directive {:?}: {}", raw, e),
        }
    }
    filter
}

/// Enable or disable debug mode at runtime.
pub fn set_debug(enabled: bool) {
    if enabled && current_level() > Level::Debug {
        set_level(Level::Debug);
    } else if !enabled && current_level() < Level::Info {
        set_level(Level::Info);
    }
}

// ============================================================================
// Tests
// ============================================================================
