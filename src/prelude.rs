//! Prelude module for convenient imports.
//!
//! ```rust
//! use devserver_plugins::prelude::*;
//! ```

pub use crate::Error;
pub use crate::Result;

// Configuration
pub use crate::config::{ConfigChangeEvent, ConfigStore, ConfigView, ScopedConfig};

// Host collaborators
pub use crate::host::{
    AssetField, AssetRegistry, AssetTest, BoxError, EventBus, HookResult, MiddlewareStack, Next,
    PluginLogger, RequestContext, ServiceTable, service_fn,
};

// Packages
pub use crate::package::{DirectoryPackageSource, PackageSource};

// Plugins
pub use crate::plugins::{
    CreateArgs, ModuleCatalog, OptionChange, PluginAssets, PluginDescriptor, PluginHooks,
    PluginHost, PluginModule, PluginRecord, PluginSystem, PluginSystemOptions, RouteArgs,
};
