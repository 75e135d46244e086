use std::path::{Path, PathBuf};

/// Plugins shipped with the host. They resolve to the built-in directory and
/// see the full host configuration.
pub const BUILTIN_PLUGINS: &[&str] = &["serve", "proxy", "livereload", "cors", "open"];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_PLUGINS.contains(&name)
}

/// Directory holding the built-in plugin `name`.
pub fn builtin_path(builtin_dir: &Path, prefix: &str, name: &str) -> PathBuf {
    builtin_dir.join(format!("{prefix}{name}"))
}
