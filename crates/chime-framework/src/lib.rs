//! # Chime Framework
//!
//! Plugin and dispatch machinery built on top of `chime-core`:
//!
//! - Handler trait for Axum-style parameter extraction, wrapped into tower
//!   services with panic recovery
//! - Basic, command, mention and CTCP muxes
//! - Plugin registry, load-order resolver and capability injector

pub mod error;
pub mod extractor;
pub mod handler;
pub mod injector;
pub mod mux;
pub mod plugin;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{
    ExtractError, ExtractResult, HandlerPanicked, InjectError, ProviderHint, RegistryError,
    ResolveError, ResolveIssue,
};
pub use extractor::{Args, FromRequest, Sender, Trailing};
pub use handler::{BoxedHandler, Handler, HandlerResponse, HandlerService, into_boxed_handler};
pub use injector::{Injector, LoadedPlugins, PluginStatus};
pub use mux::{BasicMux, CommandMux, CtcpMux, HelpInfo, MentionMux, Muxes};
pub use plugin::{PluginContext, PluginDescriptor, PluginRegistry, ValueStore};
pub use resolver::resolve;

pub use tower::BoxError;
