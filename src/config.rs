//! # Service Configuration
//!
//! [`ServiceConfig`] controls where the HTTP host listens, how registration
//! reacts to methods that cannot be exposed, and the coroutine stack size.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. built-in defaults,
//! 2. an optional YAML file ([`ServiceConfig::from_yaml_file`]),
//! 3. environment variables ([`ServiceConfig::apply_env`]).
//!
//! ## Environment Variables
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `RESTWRAP_BIND` | listen address | `0.0.0.0` |
//! | `RESTWRAP_PORT` | listen port | `5000` |
//! | `RESTWRAP_SYNTHESIS_POLICY` | `skip-and-report` or `fail-fast` | `skip-and-report` |
//! | `RESTWRAP_STACK_SIZE` | coroutine stack, decimal or `0x` hex | `0x8000` |
//!
//! Logging reads its own `RESTWRAP_LOG_*` variables, see [`crate::logging`].
//!
//! ## Example file
//!
//! ```yaml
//! bind_address: 127.0.0.1
//! port: 8080
//! synthesis_policy: fail-fast
//! stack_size: 0x10000
//! log:
//!   level: debug
//!   format: pretty
//! ```

use crate::error::ConfigError;
use crate::logging::LogConfig;
use serde::{Deserialize, Deserializer};
use std::env;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

/// What registration does with a method group that cannot be synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthesisPolicy {
    /// Log a warning, list the group in the registration report and expose
    /// the remaining methods.
    #[default]
    SkipAndReport,
    /// Reject the whole registration; nothing of the object is exposed.
    FailFast,
}

impl FromStr for SynthesisPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "skip-and-report" | "skip" => Ok(SynthesisPolicy::SkipAndReport),
            "fail-fast" | "fail" => Ok(SynthesisPolicy::FailFast),
            _ => Err(ConfigError::Invalid {
                key: "synthesis_policy",
                value: s.to_string(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for SynthesisPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub synthesis_policy: SynthesisPolicy,
    /// Coroutine stack size in bytes.
    pub stack_size: usize,
    pub log: LogConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            synthesis_policy: SynthesisPolicy::default(),
            stack_size: DEFAULT_STACK_SIZE,
            log: LogConfig::default(),
        }
    }
}

/// On-disk form; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    bind_address: Option<String>,
    port: Option<u16>,
    synthesis_policy: Option<SynthesisPolicy>,
    stack_size: Option<StackSize>,
    log: Option<LogConfig>,
}

/// Stack size written either as a number or as a `0x` string.
#[derive(Debug)]
struct StackSize(usize);

impl<'de> Deserialize<'de> for StackSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(usize),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(StackSize(n)),
            Raw::Text(s) => parse_stack_size(&s)
                .map(StackSize)
                .map_err(serde::de::Error::custom),
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] for a variable that is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Load `path`, then apply the environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        base.apply_env()
    }

    /// Defaults overridden by a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        let file: FileConfig = if text.trim().is_empty() {
            FileConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };
        let defaults = Self::default();
        Ok(Self {
            bind_address: file.bind_address.unwrap_or(defaults.bind_address),
            port: file.port.unwrap_or(defaults.port),
            synthesis_policy: file.synthesis_policy.unwrap_or(defaults.synthesis_policy),
            stack_size: file.stack_size.map_or(defaults.stack_size, |s| s.0),
            log: file.log.unwrap_or(defaults.log),
        })
    }

    /// Override with the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_lookup(|key| env::var(key).ok())
    }

    /// Override with whatever `lookup` returns for the `RESTWRAP_*` keys.
    pub fn apply_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(bind) = lookup("RESTWRAP_BIND") {
            self.bind_address = bind;
        }
        if let Some(port) = lookup("RESTWRAP_PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "RESTWRAP_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(policy) = lookup("RESTWRAP_SYNTHESIS_POLICY") {
            self.synthesis_policy = policy.parse()?;
        }
        if let Some(stack) = lookup("RESTWRAP_STACK_SIZE") {
            self.stack_size = parse_stack_size(&stack)?;
        }
        self.log = self.log.with_lookup(&lookup);
        Ok(self)
    }

    /// `bind_address:port`
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Parse a stack size given in decimal or `0x` hexadecimal.
pub fn parse_stack_size(value: &str) -> Result<usize, ConfigError> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    };
    parsed
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::Invalid {
            key: "stack_size",
            value: value.to_string(),
        })
}
