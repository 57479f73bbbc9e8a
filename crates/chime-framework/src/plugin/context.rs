//! Context handed to plugin constructors.

use std::collections::HashMap;
use std::sync::Arc;

use chime_core::{Bot, BotHandle, Capability, CapabilityKey};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::store::{ErasedValue, ValueStore, erase};
use crate::error::InjectError;
use crate::mux::{BasicMux, CommandMux, CtcpMux, MentionMux};

struct ContextInner {
    name: String,
    requires: Vec<CapabilityKey>,
    provides: Vec<CapabilityKey>,
    core: Arc<ValueStore>,
    shared: Arc<ValueStore>,
    staged: Mutex<HashMap<CapabilityKey, ErasedValue>>,
    config: Value,
}

/// Access to capabilities and configuration during plugin construction.
///
/// Cheap to clone. Constructors may keep a clone to look up capabilities
/// later, but provided values are only collected while the constructor runs.
#[derive(Clone)]
pub struct PluginContext {
    inner: Arc<ContextInner>,
}

impl PluginContext {
    pub(crate) fn new(
        name: &str,
        requires: &[CapabilityKey],
        provides: &[CapabilityKey],
        core: Arc<ValueStore>,
        shared: Arc<ValueStore>,
        config: Option<Value>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.to_string(),
                requires: requires.to_vec(),
                provides: provides.to_vec(),
                core,
                shared,
                staged: Mutex::default(),
                config: config.unwrap_or_else(|| Value::Object(Default::default())),
            }),
        }
    }

    /// Returns the plugin's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Looks up a capability.
    ///
    /// Core capabilities (the bot handle and the muxes) are always
    /// available. Anything else must have been declared with
    /// [`PluginDescriptor::requires`](super::PluginDescriptor::requires).
    pub fn require<T: Capability + ?Sized>(&self) -> Result<Arc<T>, InjectError> {
        if let Some(value) = self.inner.core.get::<T>() {
            return Ok(value);
        }
        let key = CapabilityKey::of::<T>();
        if !self.inner.requires.contains(&key) {
            return Err(InjectError::UndeclaredRequire {
                plugin: self.inner.name.clone(),
                capability: key.id(),
            });
        }
        self.inner
            .shared
            .get::<T>()
            .ok_or_else(|| InjectError::MissingValue {
                plugin: self.inner.name.clone(),
                capability: key.id(),
            })
    }

    /// Provides a declared capability to plugins loaded after this one.
    pub fn provide<T: Capability + ?Sized>(&self, value: Arc<T>) -> Result<(), InjectError> {
        let key = CapabilityKey::of::<T>();
        if !self.inner.provides.contains(&key) {
            return Err(InjectError::UndeclaredProvide {
                plugin: self.inner.name.clone(),
                capability: key.id(),
            });
        }
        let mut staged = self.inner.staged.lock();
        if staged.contains_key(&key) || self.inner.shared.contains(&key) {
            return Err(InjectError::AlreadyProvided {
                plugin: self.inner.name.clone(),
                capability: key.id(),
            });
        }
        staged.insert(key, erase(value));
        Ok(())
    }

    /// Deserializes the plugin's configuration section.
    ///
    /// A missing section deserializes from an empty table.
    pub fn config<C: DeserializeOwned>(&self) -> serde_json::Result<C> {
        serde_json::from_value(self.inner.config.clone())
    }

    /// Returns the plugin's raw configuration section.
    pub fn raw_config(&self) -> &Value {
        &self.inner.config
    }

    pub fn bot(&self) -> Result<BotHandle, InjectError> {
        self.require::<dyn Bot>()
    }

    pub fn basic_mux(&self) -> Result<Arc<BasicMux>, InjectError> {
        self.require::<BasicMux>()
    }

    pub fn command_mux(&self) -> Result<Arc<CommandMux>, InjectError> {
        self.require::<CommandMux>()
    }

    pub fn mention_mux(&self) -> Result<Arc<MentionMux>, InjectError> {
        self.require::<MentionMux>()
    }

    pub fn ctcp_mux(&self) -> Result<Arc<CtcpMux>, InjectError> {
        self.require::<CtcpMux>()
    }

    pub(crate) fn take_staged(&self) -> HashMap<CapabilityKey, ErasedValue> {
        std::mem::take(&mut *self.inner.staged.lock())
    }
}
