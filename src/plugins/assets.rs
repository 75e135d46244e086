use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::host::{AssetDefinition, AssetField, AssetTest};

/// One asset entry as a plugin declares it.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum AssetSpec {
    /// Shorthand: just a filename.
    Filename(PathBuf),
    Definition {
        filename: PathBuf,
        #[serde(default)]
        test: Option<AssetTest>,
    },
}

impl AssetSpec {
    pub fn with_test(filename: impl Into<PathBuf>, test: AssetTest) -> Self {
        AssetSpec::Definition {
            filename: filename.into(),
            test: Some(test),
        }
    }

    pub fn filename(&self) -> &Path {
        match self {
            AssetSpec::Filename(filename) | AssetSpec::Definition { filename, .. } => filename,
        }
    }

    fn test(&self) -> Option<&AssetTest> {
        match self {
            AssetSpec::Filename(_) => None,
            AssetSpec::Definition { test, .. } => test.as_ref(),
        }
    }
}

impl From<&str> for AssetSpec {
    fn from(filename: &str) -> Self {
        AssetSpec::Filename(filename.into())
    }
}

impl From<PathBuf> for AssetSpec {
    fn from(filename: PathBuf) -> Self {
        AssetSpec::Filename(filename)
    }
}

/// Assets a plugin contributes, grouped by field, with a shared `test`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PluginAssets {
    #[serde(default)]
    pub test: Option<AssetTest>,
    #[serde(default)]
    pub script: Vec<AssetSpec>,
    #[serde(default)]
    pub style: Vec<AssetSpec>,
}

impl PluginAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test(mut self, test: AssetTest) -> Self {
        self.test = Some(test);
        self
    }

    pub fn script(mut self, spec: impl Into<AssetSpec>) -> Self {
        self.script.push(spec.into());
        self
    }

    pub fn style(mut self, spec: impl Into<AssetSpec>) -> Self {
        self.style.push(spec.into());
        self
    }

    pub fn entries(&self, field: AssetField) -> &[AssetSpec] {
        match field {
            AssetField::Script => &self.script,
            AssetField::Style => &self.style,
        }
    }

    pub fn is_empty(&self) -> bool {
        AssetField::all().iter().all(|f| self.entries(*f).is_empty())
    }
}

/// Resolve `spec` against the plugin root and fill in the shared test.
pub fn normalize(spec: &AssetSpec, root: &Path, shared_test: Option<&AssetTest>) -> AssetDefinition {
    let filename = spec.filename();
    let filename = if filename.is_absolute() {
        filename.to_path_buf()
    } else {
        root.join(filename)
    };
    AssetDefinition {
        filename,
        test: spec.test().or(shared_test).cloned(),
    }
}
