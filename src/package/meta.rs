use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PACKAGE_MANIFEST: &str = "package.json";

/// The subset of `package.json` the plugin system reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Compatibility ranges keyed by host name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub engines: HashMap<String, String>,
    /// Declarative plugin module, parsed by the module loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<Value>,
}

impl PackageMeta {
    pub async fn read(dir: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read_to_string(dir.join(PACKAGE_MANIFEST)).await?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Missing or unreadable metadata yields empty metadata.
    pub async fn read_or_default(dir: &Path) -> Self {
        match Self::read(dir).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Ignoring unreadable package metadata");
                Self::default()
            }
        }
    }

    /// Declared compatibility range for `host`.
    pub fn engine(&self, host: &str) -> Option<&str> {
        self.engines.get(host).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_meta() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(PACKAGE_MANIFEST),
            r#"{"name":"devserver-plugin-qrcode","version":"1.0.3","engines":{"devserver":"^0.3.0"}}"#,
        )
        .unwrap();

        let meta = PackageMeta::read(dir.path()).await.unwrap();
        assert_eq!(meta.name.as_deref(), Some("devserver-plugin-qrcode"));
        assert_eq!(meta.version.as_deref(), Some("1.0.3"));
        assert_eq!(meta.engine("devserver"), Some("^0.3.0"));
        assert_eq!(meta.engine("node"), None);
    }

    #[tokio::test]
    async fn test_missing_meta_defaults() {
        let dir = tempdir().unwrap();
        assert!(PackageMeta::read(dir.path()).await.is_err());
        assert_eq!(
            PackageMeta::read_or_default(dir.path()).await,
            PackageMeta::default()
        );
    }

    #[tokio::test]
    async fn test_malformed_meta_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(PACKAGE_MANIFEST), "{ nope").unwrap();
        let err = PackageMeta::read(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert_eq!(
            PackageMeta::read_or_default(dir.path()).await,
            PackageMeta::default()
        );
    }
}
