//! Host configuration store and the views handed to plugins.
//!
//! ```rust,no_run
//! use devserver_plugins::config::{ConfigStore, ConfigView};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), devserver_plugins::config::ConfigError> {
//! let store = ConfigStore::with_defaults("/srv/project");
//! store.watch(|event| {
//!     if event.affect("port") {
//!         println!("port is now {:?}", event.current().get("port"));
//!     }
//! })
//! .await;
//! store.set("port", json!(9000)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Built-in plugins receive the store itself; third-party plugins receive a
//! [`ScopedConfig`] confined to `pluginConfig.<name>`.

mod defaults;
mod event;
mod scoped;
mod store;

pub use defaults::{DEFAULT_PORT, builtin_defaults};
pub use event::ConfigChangeEvent;
pub use scoped::{PLUGIN_NAMESPACE, ScopedConfig};
pub use store::{ConfigListener, ConfigStore};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur in configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Key is empty or contains an empty segment
    #[error("Invalid configuration key: '{key}'")]
    InvalidKey {
        /// The offending key
        key: String,
    },

    /// A parent segment of the key holds a non-object value
    #[error("Cannot set '{key}': '{parent}' is not an object")]
    NotAnObject {
        /// The key being written
        key: String,
        /// The parent segment that blocked the write
        parent: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// A readable, writable view over configuration.
///
/// Hooks never see the concrete store type; the plugin system decides which
/// view a plugin receives based on whether it is trusted.
#[async_trait]
pub trait ConfigView: Send + Sync {
    /// Namespace this view is confined to, `None` for the global view.
    fn scope(&self) -> Option<&str>;

    async fn get(&self, key: &str) -> Option<Value>;

    async fn set(&self, key: &str, value: Value) -> ConfigResult<()>;
}

pub(crate) fn split_key(key: &str) -> ConfigResult<Vec<String>> {
    if key.is_empty() || key.split('.').any(str::is_empty) {
        return Err(ConfigError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(key.split('.').map(str::to_string).collect())
}

pub(crate) fn lookup<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("a.b.c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(split_key("port").unwrap(), vec!["port"]);
        assert!(matches!(
            split_key(""),
            Err(ConfigError::InvalidKey { .. })
        ));
        assert!(matches!(
            split_key("a..b"),
            Err(ConfigError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_lookup() {
        let value = json!({"urls": {"style": "/client.css"}, "port": 8000});
        let path = split_key("urls.style").unwrap();
        assert_eq!(lookup(&value, &path), Some(&json!("/client.css")));
        assert_eq!(lookup(&value, &split_key("port.x").unwrap()), None);
        assert_eq!(lookup(&value, &split_key("missing").unwrap()), None);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NotAnObject {
            key: "port.value".into(),
            parent: "port".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("port.value"));
        assert!(msg.contains("not an object"));
    }
}
