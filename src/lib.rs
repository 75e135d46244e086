//! # devserver-plugins
//!
//! Plugin resolution and lifecycle orchestration for a pluggable development
//! server.
//!
//! Plugins are resolved from a list of descriptors (built-in, in-place,
//! installed, local, or installed on demand from a package source), loaded at
//! most once each, and then wired into the host's middleware, asset injector,
//! service registry and configuration store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use devserver_plugins::config::ConfigStore;
//! use devserver_plugins::host::{AssetRegistry, EventBus, MiddlewareStack, ServiceTable};
//! use devserver_plugins::package::DirectoryPackageSource;
//! use devserver_plugins::plugins::{
//!     ModuleCatalog, PluginDescriptor, PluginHost, PluginSystem, PluginSystemOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), devserver_plugins::Error> {
//!     let config = Arc::new(ConfigStore::with_defaults("./site"));
//!     let host = PluginHost::new(
//!         Arc::clone(&config),
//!         Arc::new(MiddlewareStack::new()),
//!         Arc::new(AssetRegistry::new()),
//!         EventBus::new(),
//!         Arc::new(ServiceTable::new()),
//!     );
//!
//!     let system = PluginSystem::new(
//!         PluginSystemOptions::from_config(&config).await,
//!         host,
//!         Arc::new(DirectoryPackageSource::new("/var/lib/devserver/packages")),
//!         Arc::new(ModuleCatalog::new()),
//!     )?;
//!
//!     let descriptors: Vec<PluginDescriptor> =
//!         vec!["qrcode@^1.0.0?ui=false".parse()?];
//!     system.load(&descriptors).await?;
//!     system.build().await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod host;
pub mod package;
pub mod plugins;
pub mod prelude;

pub use config::{ConfigChangeEvent, ConfigError, ConfigStore, ConfigView, ScopedConfig};
pub use host::{
    AssetDefinition, AssetField, AssetInjector, AssetRegistry, AssetTest, BoxError, EventBus,
    HookResult, MiddlewareDefinition, MiddlewareHost, MiddlewareStack, PluginLogger,
    RequestContext, ServiceError, ServiceRegistry, ServiceTable,
};
pub use package::{
    DirectoryPackageSource, InstallError, InstallOptions, InstallOutcome, PackageMeta,
    PackageSource, VersionMatcher,
};
pub use plugins::{
    ModuleCatalog, ModuleLoader, PluginDescriptor, PluginError, PluginHooks, PluginHost,
    PluginModule, PluginRecord, PluginSystem, PluginSystemOptions,
};

/// Error type for devserver-plugins operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which lifecycle phase an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    /// Descriptor resolution, installs and module loading.
    Load,
    /// Wiring plugins into the host.
    Build,
    /// Configuration access and everything else.
    Runtime,
}

impl Error {
    pub fn phase(&self) -> ErrorPhase {
        match self {
            Error::Plugin(PluginError::Build { .. }) => ErrorPhase::Build,
            Error::Plugin(PluginError::Config(_)) | Error::Config(_) | Error::Service(_) => {
                ErrorPhase::Runtime
            }
            Error::Plugin(_) | Error::Install(_) | Error::Io(_) => ErrorPhase::Load,
        }
    }

    /// No available version satisfied the requested constraint.
    pub fn is_unmatched_version(&self) -> bool {
        matches!(
            self,
            Error::Plugin(PluginError::Resolution { .. })
                | Error::Install(InstallError::VersionNotFound { .. })
                | Error::Plugin(PluginError::Install(InstallError::VersionNotFound { .. }))
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
