//! Configuration for the chime runtime.
//!
//! Settings are layered with figment from defaults, TOML (or YAML) files and
//! `CHIME_*` environment variables, then validated before the bot connects.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, ChimeConfig, ConnectionConfig, LogFormat, LogLevel, LogOutput, LogRotation,
    LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;
