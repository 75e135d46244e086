//! Package source contract, package metadata, and version matching.
//!
//! The plugin system never installs anything itself: installs go through a
//! [`PackageSource`], which also answers version queries. [`DirectoryPackageSource`]
//! is a source backed by a local package repository directory.

mod directory;
mod locate;
mod meta;
mod version;

pub use directory::DirectoryPackageSource;
pub use locate::{DEFAULT_PACKAGES_DIR, locate_package};
pub use meta::{PACKAGE_MANIFEST, PackageMeta};
pub use version::{VersionMatcher, VersionRange, best_match};

use std::path::PathBuf;

use async_trait::async_trait;

/// What to install and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    /// Project directory the package lands under.
    pub target_path: PathBuf,
    /// Registry package name, or the source path for local installs.
    pub name: String,
    pub version: Option<String>,
    pub local_install: bool,
}

impl InstallOptions {
    pub fn remote(
        target_path: impl Into<PathBuf>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            target_path: target_path.into(),
            name: name.into(),
            version: Some(version.into()),
            local_install: false,
        }
    }

    pub fn local(target_path: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            target_path: target_path.into(),
            name: source.into().display().to_string(),
            version: None,
            local_install: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Directory the package was installed into.
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Package '{name}' has no version matching '{version}'")]
    VersionNotFound { name: String, version: String },

    #[error("Package not found: {name}")]
    PackageNotFound { name: String },

    #[error("Failed to install '{name}': {message}")]
    Failed { name: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// External system able to install packages and answer version queries.
#[async_trait]
pub trait PackageSource: Send + Sync {
    async fn install(&self, options: InstallOptions) -> Result<InstallOutcome, InstallError>;

    /// Highest version of `name` satisfying `constraint`, if any.
    async fn satisfied_version(
        &self,
        name: &str,
        constraint: Option<&str>,
    ) -> Result<Option<String>, InstallError>;

    /// Every version the source knows for `name`.
    async fn list_versions(&self, name: &str) -> Result<Vec<String>, InstallError>;
}
