//! Plugin system.
//!
//! - [`PluginDescriptor`]: a plugin's name, async constructor and declared
//!   capabilities
//! - [`PluginRegistry`]: the explicit table of known plugins
//! - [`PluginContext`]: what a constructor sees while it runs
//! - [`ValueStore`]: type-erased capability values
//!
//! Ordering and construction live in [`resolver`](crate::resolver) and
//! [`injector`](crate::injector).

pub mod context;
pub mod descriptor;
pub mod registry;
pub mod store;

pub use context::PluginContext;
pub use descriptor::{PluginArc, PluginDescriptor};
pub use registry::PluginRegistry;
pub use store::{ErasedValue, ValueStore};
