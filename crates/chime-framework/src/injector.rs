//! Plugin construction.
//!
//! The [`Injector`] runs plugin constructors in a resolved order. Each
//! constructor sees a [`PluginContext`]; the capabilities it provides are
//! staged and only become visible to later plugins once the constructor
//! has succeeded and provided everything it declared.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::InjectError;
use crate::plugin::{PluginArc, PluginContext, PluginRegistry, ValueStore};

/// Load state of a plugin within one injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PluginStatus {
    #[default]
    Unloaded,
    Loading,
    Loaded,
}

/// Runs plugin constructors and threads capabilities between them.
pub struct Injector {
    registry: Arc<PluginRegistry>,
    core: Arc<ValueStore>,
    shared: Arc<ValueStore>,
    configs: HashMap<String, Value>,
    status: Mutex<HashMap<String, PluginStatus>>,
    plugins: Mutex<HashMap<String, PluginArc>>,
    order: Mutex<Vec<String>>,
}

impl Injector {
    /// Creates an injector over `registry`, serving core capabilities from
    /// `core`.
    pub fn new(registry: Arc<PluginRegistry>, core: Arc<ValueStore>) -> Self {
        Self {
            registry,
            core,
            shared: Arc::new(ValueStore::new()),
            configs: HashMap::new(),
            status: Mutex::default(),
            plugins: Mutex::default(),
            order: Mutex::default(),
        }
    }

    /// Sets the per-plugin configuration sections, keyed by plugin name.
    pub fn with_configs(mut self, configs: HashMap<String, Value>) -> Self {
        self.configs = configs;
        self
    }

    /// Returns the store of plugin-provided capabilities.
    pub fn shared_store(&self) -> &Arc<ValueStore> {
        &self.shared
    }

    pub fn status(&self, name: &str) -> PluginStatus {
        self.status.lock().get(name).copied().unwrap_or_default()
    }

    /// Loads every plugin in `order`, stopping at the first failure.
    pub async fn load_all(&self, order: &[String]) -> Result<(), InjectError> {
        for name in order {
            self.load_plugin(name).await?;
        }
        Ok(())
    }

    /// Loads a single plugin. Loading an already loaded plugin is a no-op.
    pub async fn load_plugin(&self, name: &str) -> Result<(), InjectError> {
        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| InjectError::UnknownPlugin(name.to_string()))?;

        {
            let mut status = self.status.lock();
            match status.get(name).copied().unwrap_or_default() {
                PluginStatus::Loaded => return Ok(()),
                PluginStatus::Loading => return Err(InjectError::CircularLoad(name.to_string())),
                PluginStatus::Unloaded => {
                    status.insert(name.to_string(), PluginStatus::Loading);
                }
            }
        }

        debug!(plugin = %name, "constructing plugin");
        match self.construct(name).await {
            Ok(plugin) => {
                self.plugins.lock().insert(name.to_string(), plugin);
                self.order.lock().push(name.to_string());
                self.status
                    .lock()
                    .insert(name.to_string(), PluginStatus::Loaded);
                info!(plugin = %name, provides = descriptor.provided().len(), "plugin loaded");
                Ok(())
            }
            Err(err) => {
                self.status.lock().remove(name);
                Err(err)
            }
        }
    }

    async fn construct(&self, name: &str) -> Result<PluginArc, InjectError> {
        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| InjectError::UnknownPlugin(name.to_string()))?;

        let ctx = PluginContext::new(
            name,
            descriptor.required(),
            descriptor.provided(),
            self.core.clone(),
            self.shared.clone(),
            self.configs.get(name).cloned(),
        );

        let plugin = descriptor
            .construct(ctx.clone())
            .await
            .map_err(|source| match source.downcast::<InjectError>() {
                Ok(inject) => *inject,
                Err(source) => InjectError::Constructor {
                    plugin: name.to_string(),
                    source,
                },
            })?;

        // Staged values are dropped unless every declared capability is there.
        let mut staged = ctx.take_staged();
        for key in descriptor.provided() {
            if !staged.contains_key(key) {
                return Err(InjectError::MissingOutput {
                    plugin: name.to_string(),
                    capability: key.id(),
                });
            }
        }
        for key in descriptor.provided() {
            if let Some(value) = staged.remove(key) {
                if !self.shared.insert_erased(*key, value) {
                    return Err(InjectError::AlreadyProvided {
                        plugin: name.to_string(),
                        capability: key.id(),
                    });
                }
            }
        }

        Ok(plugin)
    }

    /// Returns the plugins loaded so far.
    pub fn loaded(&self) -> LoadedPlugins {
        LoadedPlugins {
            plugins: self.plugins.lock().clone(),
            order: self.order.lock().clone(),
        }
    }

    /// Consumes the injector, returning the loaded plugins.
    pub fn into_loaded(self) -> LoadedPlugins {
        LoadedPlugins {
            plugins: self.plugins.into_inner(),
            order: self.order.into_inner(),
        }
    }
}

/// The constructed plugin values, by name.
#[derive(Clone, Default)]
pub struct LoadedPlugins {
    plugins: HashMap<String, PluginArc>,
    order: Vec<String>,
}

impl LoadedPlugins {
    /// Returns the plugin named `name` if it has type `P`.
    pub fn get<P: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<P>> {
        self.plugins
            .get(name)
            .cloned()
            .and_then(|plugin| plugin.downcast::<P>().ok())
    }

    /// Returns plugin names in load order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::Muxes;
    use crate::plugin::PluginDescriptor;
    use chime_core::Capability;
    use serde::Deserialize;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::BoxError;

    trait Greeting: Send + Sync {
        fn text(&self) -> String;
    }

    impl Capability for dyn Greeting {
        const ID: &'static str = "test.greeting";
    }

    struct Hello;

    impl Greeting for Hello {
        fn text(&self) -> String {
            "hello".into()
        }
    }

    struct Consumer {
        greeting: String,
    }

    async fn provider(ctx: PluginContext) -> Result<(), BoxError> {
        ctx.provide::<dyn Greeting>(Arc::new(Hello))?;
        Ok(())
    }

    async fn consumer(ctx: PluginContext) -> Result<Consumer, BoxError> {
        let greeting = ctx.require::<dyn Greeting>()?;
        Ok(Consumer {
            greeting: greeting.text(),
        })
    }

    async fn lazy_provider(_ctx: PluginContext) -> Result<(), BoxError> {
        Ok(())
    }

    async fn failing_provider(ctx: PluginContext) -> Result<(), BoxError> {
        ctx.provide::<dyn Greeting>(Arc::new(Hello))?;
        Err("disk on fire".into())
    }

    async fn sneaky(ctx: PluginContext) -> Result<(), BoxError> {
        ctx.require::<dyn Greeting>()?;
        Ok(())
    }

    fn injector(plugins: Vec<PluginDescriptor>) -> Injector {
        let mut registry = PluginRegistry::new();
        for p in plugins {
            registry.register(p).unwrap();
        }
        Injector::new(Arc::new(registry), Arc::new(ValueStore::new()))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_provides_flow_to_consumers() {
        let inj = injector(vec![
            PluginDescriptor::new("provider", provider).provides::<dyn Greeting>(),
            PluginDescriptor::new("consumer", consumer).requires::<dyn Greeting>(),
        ]);
        inj.load_all(&names(&["provider", "consumer"])).await.unwrap();

        assert_eq!(inj.status("consumer"), PluginStatus::Loaded);
        let loaded = inj.into_loaded();
        assert_eq!(loaded.names(), names(&["provider", "consumer"]).as_slice());
        assert_eq!(loaded.get::<Consumer>("consumer").unwrap().greeting, "hello");
        assert!(loaded.get::<Consumer>("provider").is_none());
    }

    #[tokio::test]
    async fn test_missing_output() {
        let inj = injector(vec![
            PluginDescriptor::new("lazy", lazy_provider).provides::<dyn Greeting>(),
        ]);
        let err = inj.load_plugin("lazy").await.unwrap_err();
        assert!(matches!(
            err,
            InjectError::MissingOutput { capability: "test.greeting", .. }
        ));
        assert_eq!(inj.status("lazy"), PluginStatus::Unloaded);
    }

    #[tokio::test]
    async fn test_failed_constructor_discards_staged_values() {
        let inj = injector(vec![
            PluginDescriptor::new("broken", failing_provider).provides::<dyn Greeting>(),
        ]);
        let err = inj.load_plugin("broken").await.unwrap_err();
        assert!(matches!(err, InjectError::Constructor { ref plugin, .. } if plugin == "broken"));
        assert!(inj.shared_store().is_empty());
        assert_eq!(inj.status("broken"), PluginStatus::Unloaded);
    }

    #[tokio::test]
    async fn test_undeclared_capabilities() {
        let inj = injector(vec![
            PluginDescriptor::new("sneaky", sneaky),
            PluginDescriptor::new("provider", provider),
        ]);
        assert!(matches!(
            inj.load_plugin("sneaky").await.unwrap_err(),
            InjectError::UndeclaredRequire { .. }
        ));
        assert!(matches!(
            inj.load_plugin("provider").await.unwrap_err(),
            InjectError::UndeclaredProvide { .. }
        ));
    }

    #[tokio::test]
    async fn test_double_provide() {
        async fn twice(ctx: PluginContext) -> Result<(), BoxError> {
            ctx.provide::<dyn Greeting>(Arc::new(Hello))?;
            ctx.provide::<dyn Greeting>(Arc::new(Hello))?;
            Ok(())
        }

        let inj = injector(vec![
            PluginDescriptor::new("twice", twice).provides::<dyn Greeting>(),
        ]);
        assert!(matches!(
            inj.load_plugin("twice").await.unwrap_err(),
            InjectError::AlreadyProvided { .. }
        ));
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        async fn counted(_ctx: PluginContext) -> Result<(), BoxError> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        let inj = injector(vec![PluginDescriptor::new("counted", counted)]);
        inj.load_plugin("counted").await.unwrap();
        inj.load_plugin("counted").await.unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert!(matches!(
            inj.load_plugin("ghost").await.unwrap_err(),
            InjectError::UnknownPlugin(_)
        ));
    }

    #[tokio::test]
    async fn test_circular_load_guard() {
        static INJECTOR: OnceLock<Arc<Injector>> = OnceLock::new();

        async fn reentrant(_ctx: PluginContext) -> Result<(), BoxError> {
            if let Some(inj) = INJECTOR.get() {
                inj.load_plugin("reentrant").await?;
            }
            Ok(())
        }

        let inj = Arc::new(injector(vec![PluginDescriptor::new("reentrant", reentrant)]));
        let _ = INJECTOR.set(inj.clone());

        let err = inj.load_plugin("reentrant").await.unwrap_err();
        assert!(matches!(err, InjectError::CircularLoad(ref name) if name == "reentrant"));
        assert_eq!(inj.status("reentrant"), PluginStatus::Unloaded);
    }

    #[tokio::test]
    async fn test_config_and_core_muxes() {
        #[derive(Deserialize)]
        struct GreetConfig {
            #[serde(default = "default_word")]
            word: String,
        }

        fn default_word() -> String {
            "hi".into()
        }

        struct Greeter {
            word: String,
        }

        async fn greeter(ctx: PluginContext) -> Result<Greeter, BoxError> {
            let config: GreetConfig = ctx.config()?;
            ctx.command_mux()?.event("greet", || async {}, None);
            Ok(Greeter { word: config.word })
        }

        let muxes = Muxes::default();
        let core = Arc::new(ValueStore::new());
        muxes.seed(&core);

        let mut registry = PluginRegistry::new();
        registry
            .register(PluginDescriptor::new("a", greeter))
            .unwrap();
        registry
            .register(PluginDescriptor::new("b", greeter))
            .unwrap();
        let configs = HashMap::from([("a".to_string(), serde_json::json!({ "word": "yo" }))]);
        let inj = Injector::new(Arc::new(registry), core).with_configs(configs);

        inj.load_all(&names(&["a"])).await.unwrap();
        let loaded = inj.loaded();
        assert_eq!(loaded.get::<Greeter>("a").unwrap().word, "yo");

        inj.load_plugin("b").await.unwrap();
        assert_eq!(inj.loaded().get::<Greeter>("b").unwrap().word, "hi");
        assert!(muxes.command.channel_commands().contains(&"greet".to_string()));
    }
}
