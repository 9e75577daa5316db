//! Structured logging setup.
//!
//! JSON output for production, pretty output for development. Configured from
//! the environment:
//!
//! - `RESTWRAP_LOG_LEVEL`: `trace`/`debug`/`info`/`warn`/`error` (default `info`).
//!   `RUST_LOG`, when set, takes precedence.
//! - `RESTWRAP_LOG_FORMAT`: `json` (default) or `pretty`.
//! - `RESTWRAP_LOG_INCLUDE_LOCATION`: `true` to add file and line.

use anyhow::Result;
use serde::Deserialize;
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub level: String,
    pub format: LogFormat,
    /// Include file:line in each entry.
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Read the `RESTWRAP_LOG_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::default().with_lookup(|key| env::var(key).ok())
    }

    /// Override fields with whatever `lookup` returns for the `RESTWRAP_LOG_*` keys.
    #[must_use]
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup("RESTWRAP_LOG_LEVEL") {
            self.level = level;
        }
        if let Some(format) = lookup("RESTWRAP_LOG_FORMAT") {
            self.format = LogFormat::parse(&format);
        }
        if let Some(include) = lookup("RESTWRAP_LOG_INCLUDE_LOCATION").and_then(|s| s.parse().ok())
        {
            self.include_location = include;
        }
        self
    }

    fn level(&self) -> Level {
        match self.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use restwrap::logging::{init_logging, LogConfig};
///
/// init_logging(&LogConfig::from_env()).expect("logging already initialized");
/// ```
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));

    // Client disconnects are reported by may_minihttp at lower levels.
    if let Ok(directive) = "may_minihttp::http_server=warn".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}
