//! Chime Runtime - process layer for the Chime bot runtime.
//!
//! This crate provides:
//! - Layered configuration (`ChimeConfig`, `ConfigLoader`)
//! - Logging setup (`LoggingBuilder`, `SpanEvents`)
//! - The connection-backed bot handle (`ClientBot`)
//! - Startup orchestration and the read/write loop (`ChimeRuntime`)
//!
//! ```ignore
//! use chime_runtime::ChimeRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = ChimeRuntime::builder().build()?;
//!     runtime.register_plugin(my_plugin::descriptor())?;
//!
//!     // Runs until the server hangs up or Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod builtin;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use client::ClientBot;
pub use config::{
    BotConfig, ChimeConfig, ConfigError, ConfigLoader, ConfigResult, ConnectionConfig,
    LoggingConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{ChimeRuntime, RuntimeBuilder};

// Re-export tracing for use by plugin crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for plugin code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
