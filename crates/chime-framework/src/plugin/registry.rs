//! Explicit plugin registry.

use std::collections::HashMap;

use super::descriptor::PluginDescriptor;
use crate::error::RegistryError;

/// An ordered table of plugin descriptors, keyed by name.
///
/// The entry point builds one registry and registers every plugin it knows
/// about. Which of them actually load is decided by the activation list.
#[derive(Debug, Default, Clone)]
pub struct PluginRegistry {
    plugins: Vec<PluginDescriptor>,
    index: HashMap<String, usize>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> Result<(), RegistryError> {
        let name = descriptor.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicatePlugin(name));
        }
        self.index.insert(name, self.plugins.len());
        self.plugins.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.index.get(name).map(|&i| &self.plugins[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns plugin names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
