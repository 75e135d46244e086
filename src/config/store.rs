use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::defaults::builtin_defaults;
use super::event::ConfigChangeEvent;
use super::{ConfigError, ConfigResult, ConfigView, lookup, split_key};

/// Listener invoked on every configuration change.
pub type ConfigListener = Arc<dyn Fn(&ConfigChangeEvent) + Send + Sync>;

/// Host configuration store.
///
/// Values form a JSON tree addressed with dotted keys. Listeners registered
/// with [`ConfigStore::watch`] are never removed and live as long as the store.
pub struct ConfigStore {
    data: RwLock<Arc<Value>>,
    listeners: RwLock<Vec<ConfigListener>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Create a store from an initial tree. Non-object values are discarded.
    pub fn from_value(value: Value) -> Self {
        let value = if value.is_object() {
            value
        } else {
            Value::Object(Map::new())
        };
        Self {
            data: RwLock::new(Arc::new(value)),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Create a store seeded with the host defaults, rooted at `root`.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let mut value = builtin_defaults();
        if let Some(map) = value.as_object_mut() {
            map.insert("root".into(), Value::String(root.display().to_string()));
        }
        Self::from_value(value)
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let segments = split_key(key).ok()?;
        self.get_path(&segments).await
    }

    pub(crate) async fn get_path(&self, segments: &[String]) -> Option<Value> {
        let data = self.data.read().await;
        lookup(&data, segments).cloned()
    }

    /// Write a value and notify listeners if anything changed.
    pub async fn set(&self, key: &str, value: Value) -> ConfigResult<()> {
        let segments = split_key(key)?;
        self.set_path(&segments, value).await.map(|_| ())
    }

    /// Write a value only if the key is currently unset. Returns whether a write happened.
    pub async fn set_default(&self, key: &str, value: Value) -> ConfigResult<bool> {
        let segments = split_key(key)?;
        self.set_default_path(&segments, value).await
    }

    pub(crate) async fn set_default_path(
        &self,
        segments: &[String],
        value: Value,
    ) -> ConfigResult<bool> {
        if self.get_path(segments).await.is_some() {
            return Ok(false);
        }
        self.set_path(segments, value).await
    }

    pub(crate) async fn set_path(&self, segments: &[String], value: Value) -> ConfigResult<bool> {
        let mut data = self.data.write().await;
        let prev = Arc::clone(&data);
        let mut next = (*prev).clone();
        write_path(&mut next, segments, value)?;
        if next == *prev {
            return Ok(false);
        }

        let current = Arc::new(next);
        *data = Arc::clone(&current);
        drop(data);

        let event = ConfigChangeEvent::new(segments.join("."), prev, current);
        let listeners = self.listeners.read().await.clone();
        for listener in &listeners {
            listener(&event);
        }
        Ok(true)
    }

    pub async fn watch<F>(&self, listener: F)
    where
        F: Fn(&ConfigChangeEvent) + Send + Sync + 'static,
    {
        self.watch_arc(Arc::new(listener)).await;
    }

    pub async fn watch_arc(&self, listener: ConfigListener) {
        self.listeners.write().await.push(listener);
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }

    pub async fn snapshot(&self) -> Arc<Value> {
        Arc::clone(&*self.data.read().await)
    }

    /// The host project root, if configured.
    pub async fn root(&self) -> Option<PathBuf> {
        self.get("root")
            .await
            .and_then(|v| v.as_str().map(PathBuf::from))
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl ConfigView for ConfigStore {
    fn scope(&self) -> Option<&str> {
        None
    }

    async fn get(&self, key: &str) -> Option<Value> {
        ConfigStore::get(self, key).await
    }

    async fn set(&self, key: &str, value: Value) -> ConfigResult<()> {
        ConfigStore::set(self, key, value).await
    }
}

fn write_path(root: &mut Value, segments: &[String], value: Value) -> ConfigResult<()> {
    let Some((last, parents)) = segments.split_last() else {
        return Err(ConfigError::InvalidKey { key: String::new() });
    };

    let mut node = root;
    for (depth, segment) in parents.iter().enumerate() {
        let map = node
            .as_object_mut()
            .ok_or_else(|| not_an_object(segments, depth))?;
        node = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = node
        .as_object_mut()
        .ok_or_else(|| not_an_object(segments, parents.len()))?;
    map.insert(last.clone(), value);
    Ok(())
}

fn not_an_object(segments: &[String], depth: usize) -> ConfigError {
    ConfigError::NotAnObject {
        key: segments.join("."),
        parent: segments[..depth].join("."),
    }
}
