//! # Chime
//!
//! A plugin-based, type-safe bot runtime for IRC-style chat protocols.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐  line  ┌──────────┐  PRIVMSG  ┌────────────┐
//! │ Runtime │──────▶│ BasicMux │─────────▶│ CommandMux │──▶ handlers
//! │         │       │          │          │ MentionMux │──▶ handlers
//! └─────────┘       └──────────┘          │ CtcpMux    │──▶ handlers
//!                     │ verb               └────────────┘
//!                     ▼
//!                  handlers
//! ```
//!
//! - **Runtime**: loads config, connects, reads and writes lines
//! - **Plugins**: constructed once at startup in dependency order; they
//!   exchange typed capabilities and register handlers on the muxes
//! - **Handlers**: async functions with Axum-style extractors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chime::prelude::*;
//!
//! async fn echo(ctx: PluginContext) -> Result<(), BoxError> {
//!     ctx.command_mux()?.event(
//!         "echo",
//!         |Trailing(text): Trailing| async move { text },
//!         Some(HelpInfo::new("<text>", "Repeat the text")),
//!     );
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = ChimeRuntime::builder().build()?;
//!     runtime.register_plugin(PluginDescriptor::new("echo", echo))?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use chime_core as core;
pub use chime_framework as framework;
pub use chime_runtime as runtime;

/// Commonly used types for writing plugins and bots.
///
/// ```rust,ignore
/// use chime::prelude::*;
/// ```
pub mod prelude {
    // Runtime entry point
    pub use chime_runtime::{ChimeConfig, ChimeRuntime};

    // Plugin system
    pub use chime_framework::{PluginContext, PluginDescriptor, PluginRegistry};

    // Muxes
    pub use chime_framework::{BasicMux, CommandMux, CtcpMux, HelpInfo, MentionMux};

    // Handlers and extractors
    pub use chime_framework::{Args, BoxError, FromRequest, Handler, Sender, Trailing};

    // Protocol types
    pub use chime_core::{Bot, BotHandle, Capability, Message, Prefix, Request};

    // Logging macros
    pub use chime_runtime::prelude::*;
}
