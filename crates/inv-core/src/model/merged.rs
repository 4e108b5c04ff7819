//! Whole-tree merged inventories

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::raw::serialize_keyed;
use super::timestamp::format_verified_at;
use super::{Checksum, InventoryRecord};
use crate::validate::{IssueKind, ValidationIssue};
use crate::{Error, Result};

/// Format marker written into merged inventory documents.
pub const MERGED_FORMAT: &str = "merged-v1";

/// Every record of a tree, keyed by root-relative path.
///
/// Built by the merge engine or loaded from disk; there are no mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedInventory {
    tree_root: String,
    generated_at: DateTime<Utc>,
    records: BTreeMap<String, InventoryRecord>,
}

impl MergedInventory {
    pub(crate) fn from_parts(
        tree_root: impl Into<String>,
        generated_at: DateTime<Utc>,
        records: BTreeMap<String, InventoryRecord>,
    ) -> Self {
        Self {
            tree_root: tree_root.into(),
            generated_at,
            records,
        }
    }

    /// Snapshot from records that are already root-relative.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedInventory`] if a path occurs twice.
    pub fn from_records<I>(tree_root: impl Into<String>, generated_at: DateTime<Utc>, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = InventoryRecord>,
    {
        let mut map = BTreeMap::new();
        let mut issues = Vec::new();
        for record in records {
            if map.contains_key(&record.path) {
                issues.push(ValidationIssue {
                    path: record.path.clone(),
                    kind: IssueKind::DuplicatePath,
                });
            } else {
                map.insert(record.path.clone(), record);
            }
        }
        if !issues.is_empty() {
            return Err(Error::MalformedInventory {
                directory: String::new(),
                issues,
            });
        }
        Ok(Self::from_parts(tree_root, generated_at, map))
    }

    /// Label of the tree this inventory describes.
    pub fn tree_root(&self) -> &str {
        &self.tree_root
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn get(&self, path: &str) -> Option<&InventoryRecord> {
        self.records.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(path)
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

    /// Paths holding each checksum, in path order.
    pub fn paths_by_checksum(&self) -> BTreeMap<&Checksum, Vec<&str>> {
        let mut index: BTreeMap<&Checksum, Vec<&str>> = BTreeMap::new();
        for record in self.records.values() {
            index.entry(&record.checksum).or_default().push(&record.path);
        }
        index
    }
}

impl Serialize for MergedInventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct Records<'a>(&'a BTreeMap<String, InventoryRecord>);

        impl Serialize for Records<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serialize_keyed(self.0.values(), serializer)
            }
        }

        let mut doc = serializer.serialize_struct("MergedInventory", 4)?;
        doc.serialize_field("format", MERGED_FORMAT)?;
        doc.serialize_field("tree_root", &self.tree_root)?;
        doc.serialize_field("generated_at", &format_verified_at(&self.generated_at))?;
        doc.serialize_field("records", &Records(&self.records))?;
        doc.end()
    }
}
