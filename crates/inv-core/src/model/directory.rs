//! Per-directory inventories

use std::collections::BTreeMap;

use inv_fs::join_relative;
use serde::{Serialize, Serializer};

use super::raw::serialize_keyed;
use super::{InventoryFormat, InventoryRecord};

/// The records of exactly one directory (non-recursive).
///
/// Records are keyed by path relative to the directory and kept in path
/// order, so iteration never depends on how the inventory was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryInventory {
    directory: String,
    format: InventoryFormat,
    records: BTreeMap<String, InventoryRecord>,
}

impl DirectoryInventory {
    /// Empty inventory for a tree-relative directory (`""` is the root).
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into().trim_matches('/').to_string(),
            format: InventoryFormat::Keyed,
            records: BTreeMap::new(),
        }
    }

    pub(crate) fn from_parts(
        directory: String,
        format: InventoryFormat,
        records: BTreeMap<String, InventoryRecord>,
    ) -> Self {
        Self {
            directory: directory.trim_matches('/').to_string(),
            format,
            records,
        }
    }

    /// Add a record, returning any previous record at the same path.
    pub fn insert(&mut self, record: InventoryRecord) -> Option<InventoryRecord> {
        self.records.insert(record.path.clone(), record)
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn format(&self) -> InventoryFormat {
        self.format
    }

    pub fn get(&self, path: &str) -> Option<&InventoryRecord> {
        self.records.get(path)
    }

    /// Records in path order.
    pub fn records(&self) -> impl Iterator<Item = &InventoryRecord> {
        self.records.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.records.values().map(|r| r.size).sum()
    }

    /// Tree-root-relative path of a record in this directory.
    pub fn rooted_path(&self, path: &str) -> String {
        join_relative(&self.directory, path)
    }

    /// Records rewritten relative to the tree root.
    pub fn rooted_records(&self) -> impl Iterator<Item = InventoryRecord> + '_ {
        self.records
            .values()
            .map(|record| record.rebased(self.rooted_path(&record.path)))
    }

    /// Keep descriptive metadata from `previous` for every record whose
    /// content is unchanged. Used when a rescan replaces an inventory: the
    /// crawler never reads image metadata, so dropping it would lose data.
    pub fn carry_metadata_from(&mut self, previous: &DirectoryInventory) {
        for record in self.records.values_mut() {
            if let Some(old) = previous.get(&record.path)
                && old.same_content(record)
            {
                record.captured_at = record.captured_at.or(old.captured_at);
                record.dimensions = record.dimensions.or(old.dimensions);
            }
        }
    }
}

/// Always written in keyed form.
impl Serialize for DirectoryInventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_keyed(self.records.values(), serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Checksum;
    use chrono::NaiveDate;

    fn record(path: &str, content: &[u8]) -> InventoryRecord {
        InventoryRecord::new(path, content.len() as u64, Checksum::of_bytes(content))
    }

    #[test]
    fn rooted_records_prefix_directory() {
        let mut inv = DirectoryInventory::new("2019/trip/");
        inv.insert(record("a.jpg", b"a"));
        let rooted: Vec<String> = inv.rooted_records().map(|r| r.path).collect();
        assert_eq!(rooted, vec!["2019/trip/a.jpg"]);

        let mut root = DirectoryInventory::new("");
        root.insert(record("a.jpg", b"a"));
        assert_eq!(root.rooted_records().next().unwrap().path, "a.jpg");
    }

    #[test]
    fn keyed_serialization_uses_names_as_keys() {
        let mut inv = DirectoryInventory::new("");
        inv.insert(record("b.jpg", b"bb").with_dimensions(4, 3));
        inv.insert(record("a.jpg", b"a"));

        let json = serde_json::to_value(&inv).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a.jpg", "b.jpg"]);
        assert_eq!(json["b.jpg"]["width"], 4);
        assert_eq!(json["b.jpg"]["height"], 3);
        assert!(json["a.jpg"].get("width").is_none());
    }

    #[test]
    fn carry_metadata_only_for_unchanged_content() {
        let date = NaiveDate::from_ymd_opt(2019, 7, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut previous = DirectoryInventory::new("");
        previous.insert(record("a.jpg", b"a").with_captured_at(date).with_dimensions(4, 3));
        previous.insert(record("b.jpg", b"old").with_captured_at(date));

        let mut rescanned = DirectoryInventory::new("");
        rescanned.insert(record("a.jpg", b"a"));
        rescanned.insert(record("b.jpg", b"new"));
        rescanned.carry_metadata_from(&previous);

        assert_eq!(rescanned.get("a.jpg").unwrap().captured_at, Some(date));
        assert_eq!(rescanned.get("b.jpg").unwrap().captured_at, None);
    }
}
