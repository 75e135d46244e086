//! Host collaborators the plugin system wires plugins into.
//!
//! Each collaborator is a trait so the host can supply its own engine; the
//! in-memory implementations here are complete enough to run a host on.

mod events;
mod injector;
mod logger;
mod middleware;
mod services;

pub use events::{BusEvent, EventBus};
pub use injector::{AssetDefinition, AssetField, AssetInjector, AssetRegistry, AssetTest};
pub use logger::PluginLogger;
pub use middleware::{
    HandlerFactory, MiddlewareDefinition, MiddlewareHost, MiddlewareStack, Next, RequestContext,
    RequestHandler,
};
pub use services::{ServiceError, ServiceHandler, ServiceRegistry, ServiceTable, service_fn};

/// Error type plugin code is free to return from hooks and services.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a plugin hook or service call.
pub type HookResult<T> = std::result::Result<T, BoxError>;
