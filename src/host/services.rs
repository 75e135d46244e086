//! Service registry exposed to the browser client.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use super::{BoxError, HookResult};

pub type ServiceHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, HookResult<Value>> + Send + Sync>;

/// Wrap an async closure as a [`ServiceHandler`].
pub fn service_fn<F, Fut>(f: F) -> ServiceHandler
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<Value>> + Send + 'static,
{
    Arc::new(move |payload: Value| f(payload).boxed())
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Service not found: {name}")]
    NotFound { name: String },

    #[error("Service '{name}' failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: BoxError,
    },
}

#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn register_service(&self, name: &str, handler: ServiceHandler);
}

/// Service table where the first registration of a name wins.
#[derive(Default)]
pub struct ServiceTable {
    services: DashMap<String, ServiceHandler>,
}

impl ServiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn call(&self, name: &str, payload: Value) -> Result<Value, ServiceError> {
        let handler = self
            .services
            .get(name)
            .map(|h| Arc::clone(&h))
            .ok_or_else(|| ServiceError::NotFound {
                name: name.to_string(),
            })?;
        handler(payload)
            .await
            .map_err(|source| ServiceError::Failed {
                name: name.to_string(),
                source,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[async_trait]
impl ServiceRegistry for ServiceTable {
    async fn register_service(&self, name: &str, handler: ServiceHandler) {
        match self.services.entry(name.to_string()) {
            Entry::Occupied(_) => {
                tracing::warn!(service = name, "Service already registered, keeping the first");
            }
            Entry::Vacant(slot) => {
                slot.insert(handler);
            }
        }
    }
}

impl std::fmt::Debug for ServiceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceTable")
            .field("services", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_call() {
        let table = ServiceTable::new();
        table
            .register_service(
                "echo",
                service_fn(|payload| async move { Ok(json!({ "echo": payload })) }),
            )
            .await;

        let out = table.call("echo", json!(1)).await.unwrap();
        assert_eq!(out, json!({"echo": 1}));
        assert!(table.contains("echo"));
    }

    #[tokio::test]
    async fn test_first_registration_wins() {
        let table = ServiceTable::new();
        table
            .register_service("v", service_fn(|_| async { Ok(json!(1)) }))
            .await;
        table
            .register_service("v", service_fn(|_| async { Ok(json!(2)) }))
            .await;

        assert_eq!(table.len(), 1);
        assert_eq!(table.call("v", Value::Null).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_call_errors() {
        let table = ServiceTable::new();
        let err = table.call("missing", Value::Null).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        table
            .register_service("boom", service_fn(|_| async { Err::<Value, BoxError>("exploded".into()) }))
            .await;
        let err = table.call("boom", Value::Null).await.unwrap_err();
        assert!(err.to_string().contains("exploded"));
    }
}
