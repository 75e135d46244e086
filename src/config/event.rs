use std::sync::Arc;

use serde_json::Value;

use super::{lookup, split_key};

/// Snapshot comparison delivered to config listeners after a mutation.
#[derive(Debug, Clone)]
pub struct ConfigChangeEvent {
    key: String,
    prev: Arc<Value>,
    current: Arc<Value>,
}

impl ConfigChangeEvent {
    pub(crate) fn new(key: impl Into<String>, prev: Arc<Value>, current: Arc<Value>) -> Self {
        Self {
            key: key.into(),
            prev,
            current,
        }
    }

    /// Whether the value under `key` differs between the two snapshots.
    ///
    /// Changes to a parent or a child of `key` both count.
    pub fn affect(&self, key: &str) -> bool {
        let Ok(segments) = split_key(key) else {
            return false;
        };
        lookup(&self.prev, &segments) != lookup(&self.current, &segments)
    }

    /// The key that was written.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn prev(&self) -> &Value {
        &self.prev
    }

    pub fn current(&self) -> &Value {
        &self.current
    }

    pub fn prev_snapshot(&self) -> Arc<Value> {
        Arc::clone(&self.prev)
    }

    pub fn current_snapshot(&self) -> Arc<Value> {
        Arc::clone(&self.current)
    }
}
