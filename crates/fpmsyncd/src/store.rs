//! SRV6_MY_SID_TABLE store abstraction
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-8: System Component Inventory - Keyed Local SID inventory
//! - SI-7: Software, Firmware, and Information Integrity - Whole-entry replace, no partial writes

use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

/// Keyed table the synchronization engine writes Local SIDs to
///
/// Both operations must be atomic per key.
#[async_trait]
pub trait LocalSidTable: Send {
    /// Replace every field stored at `key` with exactly `fields`
    async fn upsert(&mut self, key: &str, fields: &[(&'static str, String)]) -> Result<()>;

    /// Remove `key`; absent keys are not an error
    async fn delete(&mut self, key: &str) -> Result<()>;
}

/// In-process table for tests and dry runs
#[derive(Debug, Default, Clone)]
pub struct MemoryTable {
    entries: HashMap<String, BTreeMap<String, String>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        self.entries.get(key)
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<&str> {
        self.entries.get(key)?.get(field).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[async_trait]
impl LocalSidTable for MemoryTable {
    async fn upsert(&mut self, key: &str, fields: &[(&'static str, String)]) -> Result<()> {
        let entry = fields
            .iter()
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect();
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_replaces_fields() {
        let mut table = MemoryTable::new();
        table
            .upsert("k", &[("action", "end.x".into()), ("adj", "2001:db8::1".into())])
            .await
            .unwrap();
        table.upsert("k", &[("action", "end".into())]).await.unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.hget("k", "action"), Some("end"));
        assert_eq!(table.hget("k", "adj"), None);
    }

    #[tokio::test]
    async fn test_delete_missing_key() {
        let mut table = MemoryTable::new();
        table.delete("missing").await.unwrap();
        assert!(table.is_empty());

        table.upsert("k", &[("action", "un".into())]).await.unwrap();
        table.delete("k").await.unwrap();
        assert!(!table.contains("k"));
    }
}
