//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChimeConfig {
    /// Plugins to activate, in order. Empty activates every registered plugin.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Identity and command settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Server connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Free-form per-plugin sections, keyed by plugin name.
    #[serde(default)]
    pub plugin: HashMap<String, Value>,
}

/// Identity and command settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Nick to register with.
    #[serde(default = "default_nick")]
    pub nick: String,

    /// Username sent with `USER`.
    #[serde(default = "default_user")]
    pub user: String,

    /// Real name sent with `USER`.
    #[serde(default = "default_name")]
    pub name: String,

    /// Server password sent with `PASS`, if any.
    #[serde(default)]
    pub password: Option<String>,

    /// Prefix that marks a channel message as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            nick: default_nick(),
            user: default_user(),
            name: default_name(),
            password: None,
            command_prefix: default_command_prefix(),
        }
    }
}

fn default_nick() -> String {
    "chime".to_string()
}

fn default_user() -> String {
    "chime".to_string()
}

fn default_name() -> String {
    "Chime Bot".to_string()
}

fn default_command_prefix() -> String {
    "!".to_string()
}

/// Server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// `host:port` of the server.
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

fn default_addr() -> String {
    "127.0.0.1:6667".to_string()
}

// =============================================================================
// Logging
// =============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `compact` otherwise.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// File rotation for `output = "file"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file for `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line number.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `chime_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}
