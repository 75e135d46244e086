use std::path::{Path, PathBuf};

pub const DEFAULT_PACKAGES_DIR: &str = "node_modules";

/// Find an installed package by walking up from `root`.
///
/// Checks `<dir>/<packages_dir>/<name>` for `root` and each of its ancestors,
/// nearest first.
pub async fn locate_package(root: &Path, packages_dir: &str, name: &str) -> Option<PathBuf> {
    for dir in root.ancestors() {
        if dir.file_name().is_some_and(|n| n == packages_dir) {
            continue;
        }
        let candidate = dir.join(packages_dir).join(name);
        let is_dir = tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_locate_in_root() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join("devserver-plugin-a");
        std::fs::create_dir_all(&pkg).unwrap();

        let found = locate_package(dir.path(), DEFAULT_PACKAGES_DIR, "devserver-plugin-a").await;
        assert_eq!(found, Some(pkg));
    }

    #[tokio::test]
    async fn test_locate_in_ancestor() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join("@acme").join("devserver-plugin-b");
        std::fs::create_dir_all(&pkg).unwrap();
        let nested = dir.path().join("apps").join("web");
        std::fs::create_dir_all(&nested).unwrap();

        let found = locate_package(&nested, DEFAULT_PACKAGES_DIR, "@acme/devserver-plugin-b").await;
        assert_eq!(found, Some(pkg));
    }

    #[tokio::test]
    async fn test_locate_missing() {
        let dir = tempdir().unwrap();
        assert!(
            locate_package(dir.path(), DEFAULT_PACKAGES_DIR, "devserver-plugin-none")
                .await
                .is_none()
        );
    }
}
