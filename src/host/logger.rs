use std::sync::Arc;

/// Logger handed to plugin hooks; every line carries the plugin name.
#[derive(Debug, Clone)]
pub struct PluginLogger {
    plugin: Arc<str>,
}

impl PluginLogger {
    pub fn new(plugin: impl Into<Arc<str>>) -> Self {
        Self {
            plugin: plugin.into(),
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn log(&self, message: impl AsRef<str>) {
        tracing::info!(plugin = %self.plugin, "{}", message.as_ref());
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        tracing::debug!(plugin = %self.plugin, "{}", message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        tracing::warn!(plugin = %self.plugin, "{}", message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        tracing::error!(plugin = %self.plugin, "{}", message.as_ref());
    }
}
