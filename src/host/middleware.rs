//! Request-handling middleware contract and an ordered in-memory stack.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::HookResult;
use crate::config::ConfigView;

/// Per-request state passed through the middleware chain.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub status: Option<u16>,
    pub body: Option<String>,
    /// Free-form state middleware can use to talk to each other.
    pub state: Map<String, Value>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn respond(&mut self, status: u16, body: impl Into<String>) {
        self.status = Some(status);
        self.body = Some(body.into());
    }

    pub fn is_handled(&self) -> bool {
        self.status.is_some()
    }
}

/// Continuation handed to a middleware; calling it runs the rest of the chain.
pub type Next = Box<dyn FnOnce(RequestContext) -> BoxFuture<'static, HookResult<RequestContext>> + Send>;

/// A runnable middleware.
pub type RequestHandler = Arc<
    dyn Fn(RequestContext, Next) -> BoxFuture<'static, HookResult<RequestContext>> + Send + Sync,
>;

/// Produces a handler once the engine hands over its configuration view.
pub type HandlerFactory = Arc<dyn Fn(Arc<dyn ConfigView>) -> RequestHandler + Send + Sync>;

#[derive(Clone)]
pub struct MiddlewareDefinition {
    pub priority: i32,
    pub on_create: HandlerFactory,
}

impl MiddlewareDefinition {
    pub fn new<F>(priority: i32, on_create: F) -> Self
    where
        F: Fn(Arc<dyn ConfigView>) -> RequestHandler + Send + Sync + 'static,
    {
        Self {
            priority,
            on_create: Arc::new(on_create),
        }
    }

    /// Definition whose handler ignores the engine configuration.
    pub fn from_fn<F, Fut>(priority: i32, f: F) -> Self
    where
        F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult<RequestContext>> + Send + 'static,
    {
        let handler: RequestHandler =
            Arc::new(move |ctx: RequestContext, next: Next| f(ctx, next).boxed());
        Self::new(priority, move |_| Arc::clone(&handler))
    }
}

impl std::fmt::Debug for MiddlewareDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareDefinition")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait MiddlewareHost: Send + Sync {
    async fn add(&self, name: &str, definition: MiddlewareDefinition);
}

/// Middleware ordered by descending priority; ties keep insertion order.
#[derive(Default)]
pub struct MiddlewareStack {
    entries: RwLock<Vec<(String, MiddlewareDefinition)>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.entries.read().await.iter().any(|(n, _)| n == name)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Instantiate every handler in chain order.
    pub async fn compose(&self, config: Arc<dyn ConfigView>) -> Vec<RequestHandler> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(_, def)| (def.on_create)(Arc::clone(&config)))
            .collect()
    }

    /// Run one request through the whole chain.
    pub async fn dispatch(
        &self,
        ctx: RequestContext,
        config: Arc<dyn ConfigView>,
    ) -> HookResult<RequestContext> {
        let handlers = Arc::new(self.compose(config).await);
        run_chain(handlers, 0, ctx).await
    }
}

fn run_chain(
    handlers: Arc<Vec<RequestHandler>>,
    index: usize,
    ctx: RequestContext,
) -> BoxFuture<'static, HookResult<RequestContext>> {
    let Some(handler) = handlers.get(index).cloned() else {
        return futures::future::ready(Ok(ctx)).boxed();
    };
    let next: Next = Box::new(move |ctx| run_chain(handlers, index + 1, ctx));
    handler(ctx, next)
}

#[async_trait]
impl MiddlewareHost for MiddlewareStack {
    async fn add(&self, name: &str, definition: MiddlewareDefinition) {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => {
                tracing::debug!(middleware = name, "Replacing middleware definition");
                entry.1 = definition;
            }
            None => entries.push((name.to_string(), definition)),
        }
        entries.sort_by_key(|(_, def)| std::cmp::Reverse(def.priority));
    }
}

impl std::fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareStack").finish_non_exhaustive()
    }
}
