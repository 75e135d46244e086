use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{
    DEFAULT_PACKAGES_DIR, InstallError, InstallOptions, InstallOutcome, PackageMeta, PackageSource,
    best_match,
};

/// Package source backed by a repository directory laid out as
/// `<repository>/<name>/<version>/`.
#[derive(Debug, Clone)]
pub struct DirectoryPackageSource {
    repository: PathBuf,
    packages_dir: String,
}

impl DirectoryPackageSource {
    pub fn new(repository: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            packages_dir: DEFAULT_PACKAGES_DIR.to_string(),
        }
    }

    pub fn with_packages_dir(mut self, packages_dir: impl Into<String>) -> Self {
        self.packages_dir = packages_dir.into();
        self
    }

    pub fn repository(&self) -> &Path {
        &self.repository
    }

    async fn install_remote(&self, options: &InstallOptions) -> Result<(String, PathBuf), InstallError> {
        let name = options.name.clone();
        let version = match &options.version {
            Some(v) if semver::Version::parse(v).is_ok() => v.clone(),
            constraint => self
                .satisfied_version(&name, constraint.as_deref())
                .await?
                .ok_or_else(|| InstallError::VersionNotFound {
                    name: name.clone(),
                    version: constraint.clone().unwrap_or_else(|| "*".into()),
                })?,
        };

        let source = self.repository.join(&name).join(&version);
        if !is_dir(&source).await {
            return Err(InstallError::PackageNotFound { name });
        }
        Ok((name, source))
    }

    async fn install_local(&self, options: &InstallOptions) -> Result<(String, PathBuf), InstallError> {
        let mut source = PathBuf::from(&options.name);
        if source.is_relative() {
            source = options.target_path.join(source);
        }
        if !is_dir(&source).await {
            return Err(InstallError::PackageNotFound {
                name: options.name.clone(),
            });
        }

        let meta = PackageMeta::read_or_default(&source).await;
        let name = meta
            .name
            .or_else(|| source.file_name().map(|n| n.to_string_lossy().into_owned()))
            .ok_or_else(|| InstallError::Failed {
                name: options.name.clone(),
                message: "cannot determine package name".into(),
            })?;
        Ok((name, source))
    }

    async fn copy_dir_recursive(&self, src: &Path, dest: &Path) -> std::io::Result<()> {
        fs::create_dir_all(dest).await?;

        let mut entries = fs::read_dir(src).await?;
        while let Some(entry) = entries.next_entry().await? {
            let src_path = entry.path();
            let dest_path = dest.join(entry.file_name());

            if entry.file_type().await?.is_dir() {
                Box::pin(self.copy_dir_recursive(&src_path, &dest_path)).await?;
            } else {
                fs::copy(&src_path, &dest_path).await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl PackageSource for DirectoryPackageSource {
    async fn install(&self, options: InstallOptions) -> Result<InstallOutcome, InstallError> {
        let (name, source) = if options.local_install {
            self.install_local(&options).await?
        } else {
            self.install_remote(&options).await?
        };

        let dest = options.target_path.join(&self.packages_dir).join(&name);
        if same_dir(&source, &dest).await {
            return Ok(InstallOutcome { path: dest });
        }
        if nested_in(&dest, &source).await {
            return Err(InstallError::Failed {
                name,
                message: format!(
                    "destination {} is inside the source directory",
                    dest.display()
                ),
            });
        }
        if is_dir(&dest).await {
            fs::remove_dir_all(&dest).await?;
        }
        self.copy_dir_recursive(&source, &dest).await?;

        tracing::info!(
            package = %name,
            from = %source.display(),
            to = %dest.display(),
            "Package installed"
        );
        Ok(InstallOutcome { path: dest })
    }

    async fn satisfied_version(
        &self,
        name: &str,
        constraint: Option<&str>,
    ) -> Result<Option<String>, InstallError> {
        let versions = self.list_versions(name).await?;
        Ok(best_match(constraint, &versions))
    }

    async fn list_versions(&self, name: &str) -> Result<Vec<String>, InstallError> {
        let dir = self.repository.join(name);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Ok(parsed) = semver::Version::parse(&name) {
                versions.push((parsed, name));
            }
        }
        versions.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(versions.into_iter().map(|(_, v)| v).collect())
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Whether `path` lies inside `dir`, resolving symlinks on the part of
/// `path` that already exists.
async fn nested_in(path: &Path, dir: &Path) -> bool {
    let Ok(dir) = fs::canonicalize(dir).await else {
        return false;
    };

    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        if let Ok(mut resolved) = fs::canonicalize(existing).await {
            resolved.extend(missing.iter().rev());
            return resolved.starts_with(&dir);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.starts_with(&dir),
        }
    }
}
