use std::path::PathBuf;

use super::descriptor::PluginDescriptor;
use super::module::PluginModule;
use crate::host::PluginLogger;

/// A resolved plugin. Exactly one exists per plugin name.
#[derive(Debug, Clone)]
pub struct PluginRecord {
    pub name: String,
    /// Root directory of the implementation; relative assets resolve against it.
    pub path: PathBuf,
    pub module: PluginModule,
    /// Installed version, empty when unknown.
    pub version: String,
    pub descriptor: PluginDescriptor,
    /// Built-in plugins are trusted with the full host configuration.
    pub trusted: bool,
}

impl PluginRecord {
    pub fn logger(&self) -> PluginLogger {
        PluginLogger::new(self.name.as_str())
    }
}
