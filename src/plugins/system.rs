use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::builder::{Builder, PluginHost};
use super::descriptor::PluginDescriptor;
use super::error::PluginError;
use super::loader::ModuleLoader;
use super::options::PluginSystemOptions;
use super::record::PluginRecord;
use super::registry::PluginRegistry;
use super::resolver::Resolver;
use crate::config::ScopedConfig;
use crate::package::PackageSource;

/// Loads plugins once each and wires them into the host.
///
/// Loading is sequential and stops at the first failure; building runs all
/// plugins concurrently.
#[derive(Debug)]
pub struct PluginSystem {
    options: Arc<PluginSystemOptions>,
    registry: PluginRegistry,
    resolver: Resolver,
    builder: Builder,
    load_lock: Mutex<()>,
}

impl PluginSystem {
    pub fn new(
        options: PluginSystemOptions,
        host: PluginHost,
        source: Arc<dyn PackageSource>,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<Self, PluginError> {
        let options = Arc::new(options);
        let resolver = Resolver::new(Arc::clone(&options), source, loader)?;
        Ok(Self {
            options,
            registry: PluginRegistry::new(),
            resolver,
            builder: Builder::new(host),
            load_lock: Mutex::new(()),
        })
    }

    pub fn options(&self) -> &PluginSystemOptions {
        &self.options
    }

    pub fn host(&self) -> &PluginHost {
        self.builder.host()
    }

    pub fn get(&self, name: &str) -> Option<Arc<PluginRecord>> {
        self.registry.get(name)
    }

    pub fn records(&self) -> Vec<Arc<PluginRecord>> {
        self.registry.records()
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Resolve `descriptors` in order. The first failure aborts the rest.
    pub async fn load(&self, descriptors: &[PluginDescriptor]) -> Result<(), PluginError> {
        let _guard = self.load_lock.lock().await;
        for descriptor in descriptors {
            self.load_locked(descriptor).await?;
        }
        Ok(())
    }

    pub async fn load_one(
        &self,
        descriptor: &PluginDescriptor,
    ) -> Result<Arc<PluginRecord>, PluginError> {
        let _guard = self.load_lock.lock().await;
        self.load_locked(descriptor).await
    }

    async fn load_locked(
        &self,
        descriptor: &PluginDescriptor,
    ) -> Result<Arc<PluginRecord>, PluginError> {
        if let Some(record) = self.registry.get(&descriptor.name) {
            debug!(plugin = %descriptor.name, "Plugin already loaded");
            return Ok(record);
        }

        let record = self.registry.insert(self.resolver.resolve(descriptor).await?);
        debug!(
            plugin = %record.name,
            path = %record.path.display(),
            version = %record.version,
            trusted = record.trusted,
            "Plugin loaded"
        );

        self.seed_options(&record).await;
        Ok(record)
    }

    /// Seed descriptor options into the plugin's namespace. Existing values
    /// win; keys that cannot be written are skipped.
    async fn seed_options(&self, record: &PluginRecord) {
        let options = &record.descriptor.options;
        if options.is_empty() {
            return;
        }
        let scoped = ScopedConfig::new(Arc::clone(&self.host().config), record.name.as_str());
        for (key, value) in options {
            if let Err(e) = scoped.set_default(key, value.clone()).await {
                warn!(plugin = %record.name, key = %key, error = %e, "Failed to seed plugin option");
            }
        }
    }

    /// Build every loaded plugin. See [`Builder::build`] for failure semantics.
    pub async fn build(&self) -> Result<(), PluginError> {
        self.builder.build(self.registry.records()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::host::{AssetRegistry, EventBus, MiddlewareStack, ServiceTable};
    use crate::package::DirectoryPackageSource;
    use crate::plugins::{ModuleCatalog, PluginHooks, PluginModule};
    use serde_json::json;
    use tempfile::tempdir;

    fn system(root: &std::path::Path, config: Arc<ConfigStore>) -> PluginSystem {
        let host = PluginHost::new(
            config,
            Arc::new(MiddlewareStack::new()),
            Arc::new(AssetRegistry::new()),
            EventBus::new(),
            Arc::new(ServiceTable::new()),
        );
        PluginSystem::new(
            PluginSystemOptions::new(root).with_host("devserver", "0.3.0"),
            host,
            Arc::new(DirectoryPackageSource::new(root.join("repo"))),
            Arc::new(ModuleCatalog::new()),
        )
        .unwrap()
    }

    fn inline(name: &str) -> PluginDescriptor {
        PluginDescriptor::new(name).with_module(PluginModule::new().with_hooks(
            PluginHooks::new().on_create(|_| async { Ok(()) }),
        ))
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let root = tempdir().unwrap();
        let system = system(root.path(), Arc::new(ConfigStore::new()));

        let first = system.load_one(&inline("a")).await.unwrap();
        let second = system.load_one(&inline("a")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(system.records().len(), 1);
    }

    #[tokio::test]
    async fn test_options_seed_plugin_namespace() {
        let root = tempdir().unwrap();
        let config = Arc::new(ConfigStore::from_value(json!({
            "pluginConfig": {"qr": {"size": 100}}
        })));
        let system = system(root.path(), Arc::clone(&config));

        let descriptor = inline("qr")
            .with_option("size", json!(300))
            .with_option("ui", json!(false));
        system.load(&[descriptor]).await.unwrap();

        assert_eq!(config.get("pluginConfig.qr.size").await, Some(json!(100)));
        assert_eq!(config.get("pluginConfig.qr.ui").await, Some(json!(false)));
    }

    #[tokio::test]
    async fn test_load_stops_at_first_failure() {
        let root = tempdir().unwrap();
        let system = system(root.path(), Arc::new(ConfigStore::new()));

        let err = system
            .load(&[inline("a"), PluginDescriptor::new("missing"), inline("b")])
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::Resolution { .. }));
        assert!(system.get("a").is_some());
        assert!(system.get("b").is_none());
    }

    #[tokio::test]
    async fn test_build_runs_loaded_plugins() {
        let root = tempdir().unwrap();
        let config = Arc::new(ConfigStore::new());
        let system = system(root.path(), Arc::clone(&config));
        let descriptor = PluginDescriptor::new("marker").with_module(
            PluginModule::new().with_hooks(PluginHooks::new().on_create(|args| async move {
                args.config.set("built", json!(true)).await?;
                Ok::<(), crate::host::BoxError>(())
            })),
        );

        system.load(&[descriptor]).await.unwrap();
        system.build().await.unwrap();
        assert_eq!(config.get("pluginConfig.marker.built").await, Some(json!(true)));
    }
}
