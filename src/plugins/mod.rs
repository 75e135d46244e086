//! Plugin resolution and lifecycle.
//!
//! A [`PluginDescriptor`] names a plugin; the [`PluginSystem`] resolves it to
//! a [`PluginRecord`] exactly once and later wires the record's
//! [`PluginModule`] into the host.
//!
//! Resolution tries, in order:
//! 1. built-in plugins shipped with the host
//! 2. in-place plugins whose descriptor carries the module itself
//! 3. an installed package found by walking up from the project root
//!    (accepted only if its `engines` range admits the host version)
//! 4. the descriptor's explicit local `path`
//! 5. an install through the [`PackageSource`](crate::package::PackageSource),
//!    from the registry or from the local `path`
//!
//! Building wires, per plugin: config watches, services, assets, route
//! middleware, and finally `on_create`. Built-in plugins see the whole host
//! configuration; everyone else gets a view scoped to `pluginConfig.<name>`.

mod assets;
mod builder;
mod builtin;
mod descriptor;
mod error;
mod loader;
mod module;
mod options;
mod record;
mod registry;
mod resolver;
mod system;

pub use assets::{AssetSpec, PluginAssets, normalize as normalize_asset};
pub use builder::{Builder, PluginHost};
pub use builtin::{BUILTIN_PLUGINS, builtin_path, is_builtin};
pub use descriptor::{PluginDescriptor, normalize_plugin_name};
pub use error::PluginError;
pub use loader::{ModuleCatalog, ModuleFactory, ModuleLoader};
pub use module::{
    CreateArgs, CreateHook, ModuleManifest, OptionChange, OptionChangeHook, PluginHooks,
    PluginModule, RouteArgs, RouteHook,
};
pub use options::{DEFAULT_HOST_NAME, DEFAULT_PACKAGE_PREFIX, PluginSystemOptions};
pub use record::PluginRecord;
pub use registry::PluginRegistry;
pub use resolver::Resolver;
pub use system::PluginSystem;
