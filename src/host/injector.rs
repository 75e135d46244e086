//! Static-asset injection contract.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use tokio::sync::RwLock;

/// Asset groups a plugin may contribute to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetField {
    Script,
    Style,
}

impl AssetField {
    pub fn all() -> &'static [AssetField] {
        &[AssetField::Script, AssetField::Style]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetField::Script => "script",
            AssetField::Style => "style",
        }
    }
}

impl std::fmt::Display for AssetField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides which requests an asset is injected into.
#[derive(Clone)]
pub enum AssetTest {
    /// Regex matched against the request URL.
    Pattern(Regex),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl AssetTest {
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(AssetTest::Pattern)
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        AssetTest::Predicate(Arc::new(f))
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            AssetTest::Pattern(re) => re.is_match(url),
            AssetTest::Predicate(f) => f(url),
        }
    }
}

impl std::fmt::Debug for AssetTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetTest::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            AssetTest::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for AssetTest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        AssetTest::pattern(&pattern).map_err(serde::de::Error::custom)
    }
}

/// A normalized asset: absolute filename plus the test deciding where it goes.
#[derive(Clone, Debug)]
pub struct AssetDefinition {
    pub filename: PathBuf,
    pub test: Option<AssetTest>,
}

impl AssetDefinition {
    /// Without a test the asset applies to every page.
    pub fn applies_to(&self, url: &str) -> bool {
        self.test.as_ref().is_none_or(|t| t.matches(url))
    }
}

#[async_trait]
pub trait AssetInjector: Send + Sync {
    async fn add(&self, field: AssetField, definition: AssetDefinition);
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: RwLock<HashMap<AssetField, Vec<AssetDefinition>>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, field: AssetField) -> Vec<AssetDefinition> {
        self.assets
            .read()
            .await
            .get(&field)
            .cloned()
            .unwrap_or_default()
    }

    /// Assets of `field` that should be injected into `url`.
    pub async fn matching(&self, field: AssetField, url: &str) -> Vec<PathBuf> {
        self.assets
            .read()
            .await
            .get(&field)
            .map(|defs| {
                defs.iter()
                    .filter(|d| d.applies_to(url))
                    .map(|d| d.filename.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.assets.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AssetInjector for AssetRegistry {
    async fn add(&self, field: AssetField, definition: AssetDefinition) {
        self.assets
            .write()
            .await
            .entry(field)
            .or_default()
            .push(definition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_test_pattern() {
        let test = AssetTest::pattern(r"\.html$").unwrap();
        assert!(test.matches("/index.html"));
        assert!(!test.matches("/app.js"));
        assert!(AssetTest::pattern("(").is_err());
    }

    #[test]
    fn test_asset_test_deserialize() {
        let test: AssetTest = serde_json::from_str(r#""^/admin""#).unwrap();
        assert!(test.matches("/admin/users"));
        assert!(serde_json::from_str::<AssetTest>(r#""[""#).is_err());
    }

    #[tokio::test]
    async fn test_registry_matching() {
        let registry = AssetRegistry::new();
        registry
            .add(
                AssetField::Style,
                AssetDefinition {
                    filename: PathBuf::from("/p/all.css"),
                    test: None,
                },
            )
            .await;
        registry
            .add(
                AssetField::Style,
                AssetDefinition {
                    filename: PathBuf::from("/p/admin.css"),
                    test: Some(AssetTest::predicate(|url| url.starts_with("/admin"))),
                },
            )
            .await;

        assert_eq!(registry.len().await, 2);
        assert_eq!(
            registry.matching(AssetField::Style, "/home").await,
            vec![PathBuf::from("/p/all.css")]
        );
        assert_eq!(registry.matching(AssetField::Style, "/admin").await.len(), 2);
        assert!(registry.get(AssetField::Script).await.is_empty());
    }
}
