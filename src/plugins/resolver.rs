//! Descriptor to record resolution.
//!
//! Sources are tried in a fixed order and the first hit wins:
//! built-in, in-place, installed package found by name, explicit local path,
//! and finally install from the package source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use super::builtin::{builtin_path, is_builtin};
use super::descriptor::{PluginDescriptor, normalize_plugin_name};
use super::error::PluginError;
use super::loader::ModuleLoader;
use super::options::PluginSystemOptions;
use super::record::PluginRecord;
use crate::package::{
    InstallOptions, PackageMeta, PackageSource, VersionMatcher, locate_package,
};

pub struct Resolver {
    options: Arc<PluginSystemOptions>,
    source: Arc<dyn PackageSource>,
    loader: Arc<dyn ModuleLoader>,
    matcher: VersionMatcher,
}

impl Resolver {
    pub fn new(
        options: Arc<PluginSystemOptions>,
        source: Arc<dyn PackageSource>,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<Self, PluginError> {
        let matcher = VersionMatcher::new(&options.host_version).map_err(|source| {
            PluginError::InvalidHostVersion {
                version: options.host_version.clone(),
                source,
            }
        })?;
        Ok(Self {
            options,
            source,
            loader,
            matcher,
        })
    }

    pub async fn resolve(&self, descriptor: &PluginDescriptor) -> Result<PluginRecord, PluginError> {
        let name = descriptor.name.as_str();

        if is_builtin(name) {
            let path = builtin_path(&self.options.builtin_dir, &self.options.package_prefix, name);
            debug!(plugin = %name, path = %path.display(), "Resolving built-in plugin");
            let mut record = self.load_from(descriptor, path, None).await?;
            record.trusted = true;
            return Ok(record);
        }

        if descriptor.is_inplace() {
            debug!(plugin = %name, "Using in-place plugin");
            return Ok(PluginRecord {
                name: name.to_string(),
                path: self.options.root.clone(),
                module: descriptor.module.clone(),
                version: String::new(),
                descriptor: descriptor.clone(),
                trusted: false,
            });
        }

        let package = normalize_plugin_name(name, &self.options.package_prefix);
        if let Some(path) =
            locate_package(&self.options.root, &self.options.packages_dir, &package).await
        {
            let meta = PackageMeta::read_or_default(&path).await;
            let range = meta.engine(&self.options.host_name).unwrap_or("*");
            if self.matcher.host_satisfies(range) {
                debug!(plugin = %name, path = %path.display(), "Found installed plugin");
                return self.load_with_meta(descriptor, path, meta, None).await;
            }
            debug!(
                plugin = %name,
                range,
                host_version = %self.matcher.host_version(),
                "Installed plugin does not support this host version"
            );
        }

        if let Some(path) = &descriptor.path
            && !descriptor.install
        {
            let path = self.absolute(path);
            debug!(plugin = %name, path = %path.display(), "Loading plugin from local path");
            return self.load_from(descriptor, path, None).await;
        }

        self.install_and_load(descriptor, &package).await
    }

    async fn install_and_load(
        &self,
        descriptor: &PluginDescriptor,
        package: &str,
    ) -> Result<PluginRecord, PluginError> {
        let name = descriptor.name.as_str();
        let root = self.options.root.clone();

        let (options, target_version) = match &descriptor.path {
            None => {
                let constraint = descriptor.version.as_deref();
                let Some(version) = self.source.satisfied_version(package, constraint).await?
                else {
                    let available = self.source.list_versions(package).await?;
                    return Err(PluginError::Resolution {
                        name: name.to_string(),
                        available,
                    });
                };
                debug!(plugin = %name, version = %version, "Installing plugin from package source");
                (InstallOptions::remote(root, package, version.clone()), Some(version))
            }
            Some(path) => {
                debug!(plugin = %name, path = %path.display(), "Installing plugin from local path");
                (InstallOptions::local(root, path), None)
            }
        };

        let outcome = self.source.install(options).await?;
        info!(plugin = %name, path = %outcome.path.display(), "plugin {name} installed completely");

        self.load_from(descriptor, outcome.path, target_version).await
    }

    async fn load_from(
        &self,
        descriptor: &PluginDescriptor,
        path: PathBuf,
        fallback_version: Option<String>,
    ) -> Result<PluginRecord, PluginError> {
        let meta = PackageMeta::read_or_default(&path).await;
        self.load_with_meta(descriptor, path, meta, fallback_version)
            .await
    }

    async fn load_with_meta(
        &self,
        descriptor: &PluginDescriptor,
        path: PathBuf,
        meta: PackageMeta,
        fallback_version: Option<String>,
    ) -> Result<PluginRecord, PluginError> {
        let module = self.loader.load(&path, &meta).await?;
        let version = meta.version.or(fallback_version).unwrap_or_default();
        Ok(PluginRecord {
            name: descriptor.name.clone(),
            path,
            module,
            version,
            descriptor: descriptor.clone(),
            trusted: false,
        })
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.options.root.join(path)
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("options", &self.options)
            .field("host_version", self.matcher.host_version())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::DirectoryPackageSource;
    use crate::plugins::{ModuleCatalog, PluginHooks, PluginModule};
    use tempfile::tempdir;

    fn resolver(root: &Path, repo: &Path, catalog: ModuleCatalog) -> Resolver {
        let options = PluginSystemOptions::new(root)
            .with_host("devserver", "0.3.0")
            .with_builtin_dir(root.join("builtin"));
        Resolver::new(
            Arc::new(options),
            Arc::new(DirectoryPackageSource::new(repo)),
            Arc::new(catalog),
        )
        .unwrap()
    }

    fn write_package(dir: &Path, json: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("package.json"), json).unwrap();
    }

    #[tokio::test]
    async fn test_invalid_host_version() {
        let options = PluginSystemOptions::new("/proj").with_host("devserver", "dev");
        let err = Resolver::new(
            Arc::new(options),
            Arc::new(DirectoryPackageSource::new("/repo")),
            Arc::new(ModuleCatalog::new()),
        )
        .unwrap_err();
        assert!(matches!(err, PluginError::InvalidHostVersion { .. }));
    }

    #[tokio::test]
    async fn test_builtin_is_trusted() {
        let root = tempdir().unwrap();
        let catalog = ModuleCatalog::new();
        catalog.register_module("devserver-plugin-cors", PluginModule::new());

        let record = resolver(root.path(), root.path(), catalog)
            .resolve(&PluginDescriptor::new("cors"))
            .await
            .unwrap();
        assert!(record.trusted);
        assert_eq!(record.path, root.path().join("builtin").join("devserver-plugin-cors"));
        assert_eq!(record.version, "");
    }

    #[tokio::test]
    async fn test_inplace_uses_root() {
        let root = tempdir().unwrap();
        let descriptor =
            PluginDescriptor::new("inline").with_hooks(PluginHooks::new().on_option_change(|_| {}));

        let record = resolver(root.path(), root.path(), ModuleCatalog::new())
            .resolve(&descriptor)
            .await
            .unwrap();
        assert_eq!(record.path, root.path());
        assert!(!record.trusted);
        assert!(record.module.hooks.on_option_change.is_some());
    }

    #[tokio::test]
    async fn test_installed_package_checks_engines() {
        let root = tempdir().unwrap();
        let installed = root.path().join("node_modules").join("devserver-plugin-qr");
        write_package(
            &installed,
            r#"{"name":"devserver-plugin-qr","version":"1.1.0","engines":{"devserver":"^0.3.0"}}"#,
        );
        let catalog = ModuleCatalog::new();
        catalog.register_module("devserver-plugin-qr", PluginModule::new());

        let record = resolver(root.path(), root.path(), catalog)
            .resolve(&PluginDescriptor::new("qr"))
            .await
            .unwrap();
        assert_eq!(record.path, installed);
        assert_eq!(record.version, "1.1.0");
    }

    #[tokio::test]
    async fn test_incompatible_package_falls_through_to_path() {
        let root = tempdir().unwrap();
        write_package(
            &root.path().join("node_modules").join("devserver-plugin-qr"),
            r#"{"name":"devserver-plugin-qr","engines":{"devserver":"^9.0.0"}}"#,
        );
        let local = root.path().join("local-qr");
        std::fs::create_dir_all(&local).unwrap();
        let catalog = ModuleCatalog::new();
        catalog.register_module("local-qr", PluginModule::new());

        let record = resolver(root.path(), root.path(), catalog)
            .resolve(&PluginDescriptor::new("qr").with_path("local-qr"))
            .await
            .unwrap();
        assert_eq!(record.path, local);
        assert_eq!(record.version, "");
    }

    #[tokio::test]
    async fn test_install_from_repository() {
        let root = tempdir().unwrap();
        let repo = tempdir().unwrap();
        for version in ["0.9.0", "1.0.0", "1.2.0"] {
            write_package(
                &repo.path().join("devserver-plugin-analytics").join(version),
                &format!(r#"{{"name":"devserver-plugin-analytics","version":"{version}"}}"#),
            );
        }
        let catalog = ModuleCatalog::new();
        catalog.register_module("devserver-plugin-analytics", PluginModule::new());

        let record = resolver(root.path(), repo.path(), catalog)
            .resolve(&PluginDescriptor::new("analytics").with_version("^1.0.0"))
            .await
            .unwrap();
        assert_eq!(record.version, "1.2.0");
        assert_eq!(
            record.path,
            root.path().join("node_modules").join("devserver-plugin-analytics")
        );
    }

    #[tokio::test]
    async fn test_unmatched_version_lists_available() {
        let root = tempdir().unwrap();
        let repo = tempdir().unwrap();
        write_package(
            &repo.path().join("devserver-plugin-nomatch").join("1.0.0"),
            r#"{"version":"1.0.0"}"#,
        );

        let err = resolver(root.path(), repo.path(), ModuleCatalog::new())
            .resolve(&PluginDescriptor::new("nomatch").with_version("^9.9.9"))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nomatch"));
        assert!(msg.contains("1.0.0"));
    }
}
