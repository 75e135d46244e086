use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::PluginError;
use super::module::{ModuleManifest, PluginModule};
use crate::host::HookResult;
use crate::package::PackageMeta;

/// Turns a resolved plugin directory into its capability bundle.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, path: &Path, meta: &PackageMeta) -> Result<PluginModule, PluginError>;
}

pub type ModuleFactory = Arc<dyn Fn(&Path) -> HookResult<PluginModule> + Send + Sync>;

/// Module loader for a host that links its plugins in.
///
/// Native modules are registered by package name. A package without a native
/// module can still ship a declarative one under the `plugin` key of its
/// metadata (assets, watches, priority, configs).
#[derive(Default)]
pub struct ModuleCatalog {
    factories: DashMap<String, ModuleFactory>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, package: impl Into<String>, factory: F)
    where
        F: Fn(&Path) -> HookResult<PluginModule> + Send + Sync + 'static,
    {
        self.factories.insert(package.into(), Arc::new(factory));
    }

    /// Register a module that does not depend on its install location.
    pub fn register_module(&self, package: impl Into<String>, module: PluginModule) {
        self.register(package, move |_| Ok(module.clone()));
    }

    pub fn contains(&self, package: &str) -> bool {
        self.factories.contains_key(package)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

fn package_name(path: &Path, meta: &PackageMeta) -> Option<String> {
    meta.name.clone().or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
    })
}

#[async_trait]
impl ModuleLoader for ModuleCatalog {
    async fn load(&self, path: &Path, meta: &PackageMeta) -> Result<PluginModule, PluginError> {
        let load_error = |reason: String| PluginError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let package = package_name(path, meta);
        let factory = package
            .as_deref()
            .and_then(|p| self.factories.get(p).map(|f| Arc::clone(&f)));
        if let Some(factory) = factory {
            return factory(path).map_err(|e| load_error(e.to_string()));
        }

        match &meta.plugin {
            Some(declared) => serde_json::from_value::<ModuleManifest>(declared.clone())
                .map(PluginModule::from)
                .map_err(|e| load_error(format!("invalid declarative module: {e}"))),
            None => Err(load_error(format!(
                "no module registered for package '{}'",
                package.unwrap_or_default()
            ))),
        }
    }
}

impl std::fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut packages: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        packages.sort();
        f.debug_struct("ModuleCatalog")
            .field("packages", &packages)
            .finish()
    }
}
