//! Wires loaded plugins into the host collaborators.

use std::sync::Arc;

use futures::FutureExt;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, warn};

use super::assets::normalize;
use super::error::PluginError;
use super::module::{CreateArgs, OptionChange, RouteArgs};
use super::record::PluginRecord;
use crate::config::{ConfigChangeEvent, ConfigStore, ConfigView, ScopedConfig};
use crate::host::{
    AssetField, AssetInjector, EventBus, MiddlewareDefinition, MiddlewareHost, Next,
    RequestContext, RequestHandler, ServiceRegistry,
};

/// The host collaborators plugins are wired into.
#[derive(Clone)]
pub struct PluginHost {
    pub config: Arc<ConfigStore>,
    pub middleware: Arc<dyn MiddlewareHost>,
    pub injector: Arc<dyn AssetInjector>,
    pub events: EventBus,
    pub io: Arc<dyn ServiceRegistry>,
}

impl PluginHost {
    pub fn new(
        config: Arc<ConfigStore>,
        middleware: Arc<dyn MiddlewareHost>,
        injector: Arc<dyn AssetInjector>,
        events: EventBus,
        io: Arc<dyn ServiceRegistry>,
    ) -> Self {
        Self {
            config,
            middleware,
            injector,
            events,
            io,
        }
    }

    /// The configuration a plugin's hooks get to see.
    pub fn config_for(&self, record: &PluginRecord) -> Arc<dyn ConfigView> {
        if record.trusted {
            Arc::clone(&self.config) as Arc<dyn ConfigView>
        } else {
            Arc::new(ScopedConfig::new(Arc::clone(&self.config), record.name.as_str()))
        }
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("config", &self.config)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Builder {
    host: PluginHost,
}

impl Builder {
    pub fn new(host: PluginHost) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &PluginHost {
        &self.host
    }

    /// Build every record concurrently.
    ///
    /// Returns the first failure as soon as it happens. Other builds keep
    /// running in the background and nothing already registered is undone.
    pub async fn build(&self, records: Vec<Arc<PluginRecord>>) -> Result<(), PluginError> {
        let mut pending: FuturesUnordered<_> = records
            .into_iter()
            .map(|record| {
                let builder = self.clone();
                let plugin = record.name.clone();
                tokio::spawn(async move { builder.build_one(&record).await })
                    .map(move |joined| (plugin, joined))
            })
            .collect();

        while let Some((plugin, joined)) = pending.next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(plugin = %plugin, error = %e, "Plugin build failed");
                    return Err(e);
                }
                Err(e) => {
                    warn!(plugin = %plugin, error = %e, "Plugin build task aborted");
                    return Err(PluginError::Build {
                        plugin,
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(())
    }

    /// Wire one plugin: config watch, services, assets, route middleware,
    /// then `on_create`. The first four are applied even if `on_create` fails.
    pub async fn build_one(&self, record: &PluginRecord) -> Result<(), PluginError> {
        let module = &record.module;
        let hooks = &module.hooks;
        let name = record.name.as_str();
        let config = self.host.config_for(record);
        let logger = record.logger();

        if let Some(on_option_change) = hooks.on_option_change.clone() {
            let watches = module.watches.clone();
            self.host
                .config
                .watch(move |event: &ConfigChangeEvent| {
                    let keys: Vec<String> = watches
                        .iter()
                        .filter(|key| event.affect(key))
                        .cloned()
                        .collect();
                    if keys.is_empty() {
                        return;
                    }
                    on_option_change(OptionChange {
                        keys,
                        prev_config: event.prev_snapshot(),
                        config: event.current_snapshot(),
                    });
                })
                .await;
            debug!(plugin = %name, watches = ?module.watches, "Watching configuration");
        }

        for (service, handler) in &module.services {
            self.host
                .io
                .register_service(service, Arc::clone(handler))
                .await;
            debug!(plugin = %name, service = %service, "Registered service");
        }

        if let Some(assets) = &module.assets {
            for field in AssetField::all() {
                for spec in assets.entries(*field) {
                    let definition = normalize(spec, &record.path, assets.test.as_ref());
                    debug!(
                        plugin = %name,
                        field = %field,
                        filename = %definition.filename.display(),
                        "Registered asset"
                    );
                    self.host.injector.add(*field, definition).await;
                }
            }
        }

        if let Some(on_route) = hooks.on_route.clone() {
            let route_config = Arc::clone(&config);
            let route_logger = logger.clone();
            let definition = MiddlewareDefinition::new(
                module.priority.unwrap_or_default(),
                move |_engine_config| -> RequestHandler {
                    let on_route = Arc::clone(&on_route);
                    let args = RouteArgs {
                        config: Arc::clone(&route_config),
                        logger: route_logger.clone(),
                    };
                    Arc::new(move |ctx: RequestContext, next: Next| {
                        on_route(ctx, next, args.clone())
                    })
                },
            );
            self.host.middleware.add(name, definition).await;
            debug!(plugin = %name, priority = ?module.priority, "Registered route middleware");
        }

        if let Some(on_create) = &hooks.on_create {
            let args = CreateArgs {
                middleware: Arc::clone(&self.host.middleware),
                injector: Arc::clone(&self.host.injector),
                events: self.host.events.clone(),
                config,
                io: Arc::clone(&self.host.io),
                logger,
            };
            on_create(args).await.map_err(|source| PluginError::Build {
                plugin: name.to_string(),
                source,
            })?;
        }

        Ok(())
    }
}
