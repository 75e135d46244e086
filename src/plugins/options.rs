use std::path::PathBuf;

use crate::config::ConfigStore;
use crate::package::DEFAULT_PACKAGES_DIR;

pub const DEFAULT_HOST_NAME: &str = "devserver";
pub const DEFAULT_PACKAGE_PREFIX: &str = "devserver-plugin-";

/// Where plugins come from and which host they are loaded into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSystemOptions {
    /// Project root: base for lookups, installs and in-place plugins.
    pub root: PathBuf,
    /// Key read from a package's `engines` map.
    pub host_name: String,
    pub host_version: String,
    /// Directory holding the built-in plugins.
    pub builtin_dir: PathBuf,
    pub packages_dir: String,
    pub package_prefix: String,
}

impl PluginSystemOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            host_name: DEFAULT_HOST_NAME.to_string(),
            host_version: env!("CARGO_PKG_VERSION").to_string(),
            builtin_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("builtin"),
            packages_dir: DEFAULT_PACKAGES_DIR.to_string(),
            package_prefix: DEFAULT_PACKAGE_PREFIX.to_string(),
        }
    }

    /// Options rooted at the store's `root`, or the working directory.
    pub async fn from_config(config: &ConfigStore) -> Self {
        let root = match config.root().await {
            Some(root) => root,
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        Self::new(root)
    }

    pub fn with_host(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.host_name = name.into();
        self.host_version = version.into();
        self
    }

    pub fn with_builtin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.builtin_dir = dir.into();
        self
    }

    pub fn with_packages_dir(mut self, dir: impl Into<String>) -> Self {
        self.packages_dir = dir.into();
        self
    }

    pub fn with_package_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.package_prefix = prefix.into();
        self
    }
}
