use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::record::PluginRecord;

/// Loaded plugins by name. Entries are written once and never evicted.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    records: DashMap<String, Arc<PluginRecord>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<PluginRecord>> {
        self.records.get(name).map(|r| Arc::clone(&r))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Store `record` unless its name is taken; returns the stored record.
    pub(crate) fn insert(&self, record: PluginRecord) -> Arc<PluginRecord> {
        match self.records.entry(record.name.clone()) {
            Entry::Occupied(existing) => Arc::clone(existing.get()),
            Entry::Vacant(slot) => Arc::clone(slot.insert(Arc::new(record)).value()),
        }
    }

    /// All records, ordered by name.
    pub fn records(&self) -> Vec<Arc<PluginRecord>> {
        let mut records: Vec<Arc<PluginRecord>> =
            self.records.iter().map(|e| Arc::clone(e.value())).collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    pub fn names(&self) -> Vec<String> {
        self.records().iter().map(|r| r.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{PluginDescriptor, PluginModule};

    fn record(name: &str, version: &str) -> PluginRecord {
        PluginRecord {
            name: name.into(),
            path: "/plugins".into(),
            module: PluginModule::new(),
            version: version.into(),
            descriptor: PluginDescriptor::new(name),
            trusted: false,
        }
    }

    #[test]
    fn test_insert_once() {
        let registry = PluginRegistry::new();
        let first = registry.insert(record("qrcode", "1.0.0"));
        let second = registry.insert(record("qrcode", "2.0.0"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.version, "1.0.0");
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.get("qrcode").unwrap(), &first));
    }

    #[test]
    fn test_records_sorted() {
        let registry = PluginRegistry::new();
        registry.insert(record("zeta", ""));
        registry.insert(record("alpha", ""));
        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
        assert!(registry.contains("zeta"));
        assert!(registry.get("missing").is_none());
        assert!(!registry.is_empty());
    }
}
