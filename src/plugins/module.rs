//! The capability bundle a loaded plugin exposes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::Value;

use super::assets::PluginAssets;
use crate::config::ConfigView;
use crate::host::{
    AssetInjector, EventBus, HookResult, MiddlewareHost, Next, PluginLogger, RequestContext,
    ServiceHandler, ServiceRegistry,
};

/// Extra arguments handed to `on_route` on every request.
#[derive(Clone)]
pub struct RouteArgs {
    pub config: Arc<dyn ConfigView>,
    pub logger: PluginLogger,
}

/// Everything `on_create` gets to wire itself into the host.
#[derive(Clone)]
pub struct CreateArgs {
    pub middleware: Arc<dyn MiddlewareHost>,
    pub injector: Arc<dyn AssetInjector>,
    pub events: EventBus,
    pub config: Arc<dyn ConfigView>,
    pub io: Arc<dyn ServiceRegistry>,
    pub logger: PluginLogger,
}

/// Delivered to `on_option_change` when watched keys change.
#[derive(Debug, Clone)]
pub struct OptionChange {
    /// The watched keys this change affected.
    pub keys: Vec<String>,
    pub prev_config: Arc<Value>,
    pub config: Arc<Value>,
}

pub type RouteHook = Arc<
    dyn Fn(RequestContext, Next, RouteArgs) -> BoxFuture<'static, HookResult<RequestContext>>
        + Send
        + Sync,
>;
pub type CreateHook = Arc<dyn Fn(CreateArgs) -> BoxFuture<'static, HookResult<()>> + Send + Sync>;
pub type OptionChangeHook = Arc<dyn Fn(OptionChange) + Send + Sync>;

#[derive(Clone, Default)]
pub struct PluginHooks {
    pub on_route: Option<RouteHook>,
    pub on_create: Option<CreateHook>,
    pub on_option_change: Option<OptionChangeHook>,
}

impl PluginHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_route<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RequestContext, Next, RouteArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult<RequestContext>> + Send + 'static,
    {
        self.on_route = Some(Arc::new(
            move |ctx: RequestContext, next: Next, args: RouteArgs| f(ctx, next, args).boxed(),
        ));
        self
    }

    pub fn on_create<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CreateArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult<()>> + Send + 'static,
    {
        self.on_create = Some(Arc::new(move |args: CreateArgs| f(args).boxed()));
        self
    }

    pub fn on_option_change<F>(mut self, f: F) -> Self
    where
        F: Fn(OptionChange) + Send + Sync + 'static,
    {
        self.on_option_change = Some(Arc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_route.is_none() && self.on_create.is_none() && self.on_option_change.is_none()
    }
}

impl std::fmt::Debug for PluginHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHooks")
            .field("on_route", &self.on_route.is_some())
            .field("on_create", &self.on_create.is_some())
            .field("on_option_change", &self.on_option_change.is_some())
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct PluginModule {
    pub hooks: PluginHooks,
    pub assets: Option<PluginAssets>,
    pub services: HashMap<String, ServiceHandler>,
    /// Plugin-declared configuration schema. Carried but not interpreted.
    pub configs: Option<Value>,
    /// Configuration keys whose changes reach `on_option_change`.
    pub watches: Vec<String>,
    /// Middleware ordering hint; higher runs earlier.
    pub priority: Option<i32>,
}

impl PluginModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hooks(mut self, hooks: PluginHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_assets(mut self, assets: PluginAssets) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn with_service(mut self, name: impl Into<String>, handler: ServiceHandler) -> Self {
        self.services.insert(name.into(), handler);
        self
    }

    pub fn with_configs(mut self, configs: Value) -> Self {
        self.configs = Some(configs);
        self
    }

    pub fn watch(mut self, key: impl Into<String>) -> Self {
        self.watches.push(key.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

impl std::fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut services: Vec<&String> = self.services.keys().collect();
        services.sort();
        f.debug_struct("PluginModule")
            .field("hooks", &self.hooks)
            .field("assets", &self.assets)
            .field("services", &services)
            .field("configs", &self.configs)
            .field("watches", &self.watches)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Declarative module read from package metadata. It cannot carry code, so
/// hooks and services are always empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleManifest {
    #[serde(default)]
    pub assets: Option<PluginAssets>,
    #[serde(default)]
    pub configs: Option<Value>,
    #[serde(default)]
    pub watches: Vec<String>,
    #[serde(default)]
    pub priority: Option<i32>,
}

impl From<ModuleManifest> for PluginModule {
    fn from(manifest: ModuleManifest) -> Self {
        Self {
            hooks: PluginHooks::default(),
            assets: manifest.assets,
            services: HashMap::new(),
            configs: manifest.configs,
            watches: manifest.watches,
            priority: manifest.priority,
        }
    }
}
