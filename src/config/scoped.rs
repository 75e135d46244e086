use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::store::ConfigStore;
use super::{ConfigResult, ConfigView, split_key};

/// Top-level key under which every plugin namespace lives.
pub const PLUGIN_NAMESPACE: &str = "pluginConfig";

/// Configuration view confined to one plugin's namespace.
///
/// Keys are resolved under `pluginConfig.<plugin>`; the view has no way to
/// address anything outside it.
#[derive(Clone)]
pub struct ScopedConfig {
    store: Arc<ConfigStore>,
    plugin: String,
}

impl ScopedConfig {
    pub fn new(store: Arc<ConfigStore>, plugin: impl Into<String>) -> Self {
        Self {
            store,
            plugin: plugin.into(),
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// The whole namespace as one object, if anything is set.
    pub async fn all(&self) -> Option<Value> {
        self.store.get_path(&self.namespace()).await
    }

    /// Seed a value without overwriting an existing one.
    pub async fn set_default(&self, key: &str, value: Value) -> ConfigResult<bool> {
        let path = self.path(key)?;
        self.store.set_default_path(&path, value).await
    }

    /// Absolute dotted key of `key` inside the host store.
    pub fn host_key(&self, key: &str) -> String {
        format!("{PLUGIN_NAMESPACE}.{}.{key}", self.plugin)
    }

    fn namespace(&self) -> Vec<String> {
        vec![PLUGIN_NAMESPACE.to_string(), self.plugin.clone()]
    }

    fn path(&self, key: &str) -> ConfigResult<Vec<String>> {
        let mut path = self.namespace();
        path.extend(split_key(key)?);
        Ok(path)
    }
}

impl std::fmt::Debug for ScopedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedConfig")
            .field("plugin", &self.plugin)
            .finish()
    }
}

#[async_trait]
impl ConfigView for ScopedConfig {
    fn scope(&self) -> Option<&str> {
        Some(&self.plugin)
    }

    async fn get(&self, key: &str) -> Option<Value> {
        let path = self.path(key).ok()?;
        self.store.get_path(&path).await
    }

    async fn set(&self, key: &str, value: Value) -> ConfigResult<()> {
        let path = self.path(key)?;
        self.store.set_path(&path, value).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scoped_reads_own_namespace_only() {
        let store = Arc::new(ConfigStore::with_defaults("/srv"));
        let scoped = ScopedConfig::new(Arc::clone(&store), "analytics");

        scoped.set("token", json!("abc")).await.unwrap();

        assert_eq!(scoped.get("token").await, Some(json!("abc")));
        assert_eq!(
            store.get("pluginConfig.analytics.token").await,
            Some(json!("abc"))
        );
        // host keys are invisible through the scoped view
        assert_eq!(scoped.get("port").await, None);
        assert_eq!(scoped.get("root").await, None);
    }

    #[tokio::test]
    async fn test_scoped_names_with_dots() {
        let store = Arc::new(ConfigStore::new());
        let scoped = ScopedConfig::new(Arc::clone(&store), "@acme/plugin.v2");
        scoped.set("level", json!(3)).await.unwrap();

        assert_eq!(scoped.get("level").await, Some(json!(3)));
        assert_eq!(scoped.all().await, Some(json!({"level": 3})));
    }

    #[tokio::test]
    async fn test_scoped_set_default() {
        let store = Arc::new(ConfigStore::new());
        let scoped = ScopedConfig::new(store, "qrcode");
        assert!(scoped.set_default("size", json!(10)).await.unwrap());
        assert!(!scoped.set_default("size", json!(20)).await.unwrap());
        assert_eq!(scoped.get("size").await, Some(json!(10)));
        assert_eq!(scoped.scope(), Some("qrcode"));
        assert_eq!(scoped.host_key("size"), "pluginConfig.qrcode.size");
    }
}
