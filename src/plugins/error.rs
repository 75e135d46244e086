use std::path::PathBuf;

use crate::config::ConfigError;
use crate::host::BoxError;
use crate::package::InstallError;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error(
        "Unmatched version for plugin '{name}', please use another version. Available:\n{}",
        list_versions(.available)
    )]
    Resolution { name: String, available: Vec<String> },

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("Failed to load plugin at {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Plugin '{plugin}' failed to build: {source}")]
    Build {
        plugin: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid plugin descriptor '{input}': {reason}")]
    InvalidDescriptor { input: String, reason: String },

    #[error("Invalid host version '{version}': {source}")]
    InvalidHostVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn list_versions(available: &[String]) -> String {
    if available.is_empty() {
        "(none)".to_string()
    } else {
        available.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_lists_versions() {
        let err = PluginError::Resolution {
            name: "nomatch".into(),
            available: vec!["1.0.0".into(), "1.1.0".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("nomatch"));
        assert!(msg.contains("\n1.0.0\n1.1.0"));

        let err = PluginError::Resolution {
            name: "ghost".into(),
            available: vec![],
        };
        assert!(err.to_string().ends_with("(none)"));
    }

    #[test]
    fn test_install_error_is_transparent() {
        let err: PluginError = InstallError::Failed {
            name: "p".into(),
            message: "registry offline".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Failed to install 'p': registry offline");
    }

    #[test]
    fn test_build_error_keeps_source() {
        let err = PluginError::Build {
            plugin: "qrcode".into(),
            source: "port in use".into(),
        };
        assert!(err.to_string().contains("qrcode"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let plugin_err: PluginError = io_err.into();
        assert!(matches!(plugin_err, PluginError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let plugin_err: PluginError = json_err.into();
        assert!(matches!(plugin_err, PluginError::Json(_)));
    }
}
