//! Plugin descriptor: name, constructor and declared capabilities.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chime_core::{Capability, CapabilityKey};
use futures::FutureExt;
use futures::future::BoxFuture;
use tower::BoxError;

use super::context::PluginContext;

/// A constructed plugin, type-erased.
pub type PluginArc = Arc<dyn Any + Send + Sync>;

type Constructor =
    Arc<dyn Fn(PluginContext) -> BoxFuture<'static, Result<PluginArc, BoxError>> + Send + Sync>;

/// Describes how to build a plugin and what it exchanges with others.
///
/// # Example
///
/// ```rust,ignore
/// async fn karma(ctx: PluginContext) -> anyhow::Result<Karma> {
///     let store = ctx.require::<dyn KarmaStore>()?;
///     let commands = ctx.command_mux()?;
///     // register handlers ...
///     Ok(Karma { store })
/// }
///
/// registry.register(
///     PluginDescriptor::new("karma", karma).requires::<dyn KarmaStore>(),
/// )?;
/// ```
#[derive(Clone)]
pub struct PluginDescriptor {
    name: String,
    constructor: Constructor,
    requires: Vec<CapabilityKey>,
    provides: Vec<CapabilityKey>,
}

impl PluginDescriptor {
    /// Creates a descriptor from an async constructor.
    pub fn new<F, Fut, P, E>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, E>> + Send + 'static,
        P: Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        let constructor: Constructor = Arc::new(move |ctx| {
            constructor(ctx)
                .map(|result| match result {
                    Ok(plugin) => Ok(Arc::new(plugin) as PluginArc),
                    Err(err) => Err(err.into()),
                })
                .boxed()
        });
        Self {
            name: name.into(),
            constructor,
            requires: Vec::new(),
            provides: Vec::new(),
        }
    }

    /// Declares a required capability.
    pub fn requires<T: Capability + ?Sized>(mut self) -> Self {
        let key = CapabilityKey::of::<T>();
        if !self.requires.contains(&key) {
            self.requires.push(key);
        }
        self
    }

    /// Declares a provided capability.
    pub fn provides<T: Capability + ?Sized>(mut self) -> Self {
        let key = CapabilityKey::of::<T>();
        if !self.provides.contains(&key) {
            self.provides.push(key);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required(&self) -> &[CapabilityKey] {
        &self.requires
    }

    pub fn provided(&self) -> &[CapabilityKey] {
        &self.provides
    }

    pub(crate) fn construct(&self, ctx: PluginContext) -> BoxFuture<'static, Result<PluginArc, BoxError>> {
        (self.constructor)(ctx)
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("provides", &self.provides)
            .finish_non_exhaustive()
    }
}
