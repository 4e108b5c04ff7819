//! Unvalidated wire forms of inventory documents
//!
//! Per-directory inventories exist in two shapes. The keyed form maps each
//! file name to an object; the older list form holds one array per file:
//! `[name, size, checksum]` optionally followed by a capture date and a
//! `"WxH"` dimension string. Both are read into [`RawRecord`]s so that
//! validation sees every entry, including repeated names that a plain map
//! deserializer would silently collapse.

use std::fmt;

use chrono::{DateTime, Utc};
use inv_fs::ScanOutcome;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::record::{InventoryRecord, serialize_captured, serialize_verified};
use super::timestamp::format_verified_at;
use super::{Checksum, Dimensions, MERGED_FORMAT};

/// Which on-disk shape an inventory was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InventoryFormat {
    /// Object keyed by file name
    #[default]
    Keyed,
    /// Array of `[name, size, checksum, ...]` entries
    Legacy,
}

/// One entry as found on disk, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub path: String,
    pub size: Option<i64>,
    pub checksum: Option<String>,
    pub captured_at: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub verified_at: Option<String>,
}

impl RawRecord {
    pub fn new(path: impl Into<String>, size: i64, checksum: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: Some(size),
            checksum: Some(checksum.into()),
            ..Self::default()
        }
    }
}

/// Body of a keyed-form entry.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecordBody {
    size: Option<i64>,
    checksum: Option<String>,
    captured_at: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    verified_at: Option<String>,
}

impl RawRecordBody {
    fn into_record(self, path: String) -> RawRecord {
        RawRecord {
            path,
            size: self.size,
            checksum: self.checksum,
            captured_at: self.captured_at,
            width: self.width,
            height: self.height,
            verified_at: self.verified_at,
        }
    }
}

/// All entries of one inventory document in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntries {
    pub format: InventoryFormat,
    pub records: Vec<RawRecord>,
}

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntriesVisitor)
    }
}

struct EntriesVisitor;

impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = RawEntries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed by file name or a list of [name, size, checksum] entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawEntries, A::Error> {
        let mut records = Vec::new();
        while let Some((path, body)) = map.next_entry::<String, RawRecordBody>()? {
            records.push(body.into_record(path));
        }
        Ok(RawEntries {
            format: InventoryFormat::Keyed,
            records,
        })
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawEntries, A::Error> {
        let mut records = Vec::new();
        while let Some(entry) = seq.next_element::<Vec<Value>>()? {
            records.push(legacy_entry(entry).map_err(de::Error::custom)?);
        }
        Ok(RawEntries {
            format: InventoryFormat::Legacy,
            records,
        })
    }
}

fn legacy_entry(entry: Vec<Value>) -> Result<RawRecord, String> {
    if !(3..=5).contains(&entry.len()) {
        return Err(format!(
            "list entry must have 3 to 5 elements, found {}",
            entry.len()
        ));
    }
    let mut items = entry.into_iter();
    let path = match items.next() {
        Some(Value::String(name)) => name,
        other => return Err(format!("list entry name must be a string, found {other:?}")),
    };
    let size = match items.next() {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::Null) => None,
        other => return Err(format!("size of '{path}' must be a number, found {other:?}")),
    };
    let checksum = optional_string(items.next(), &path, "checksum")?;
    let captured_at = optional_string(items.next(), &path, "capture date")?;

    let (width, height) = match optional_string(items.next(), &path, "dimensions")? {
        Some(text) => match Dimensions::parse(&text) {
            Some(d) => (Some(i64::from(d.width)), Some(i64::from(d.height))),
            None => partial_dimensions(&text),
        },
        None => (None, None),
    };

    Ok(RawRecord {
        path,
        size,
        checksum,
        captured_at,
        width,
        height,
        verified_at: None,
    })
}

fn optional_string(value: Option<Value>, path: &str, what: &str) -> Result<Option<String>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(format!("{what} of '{path}' must be a string, found {other}")),
    }
}

/// Salvage what a damaged `WxH` string holds so validation can report it.
fn partial_dimensions(text: &str) -> (Option<i64>, Option<i64>) {
    let mut parts = text.split(['x', 'X']).map(|p| p.trim().parse::<i64>().ok());
    let width = parts.next().flatten();
    let height = parts.next().flatten();
    match (width, height) {
        (None, None) => (Some(0), None),
        pair => pair,
    }
}

/// A per-directory inventory as read, tagged with its tree-relative
/// directory (`""` for the tree root).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDirectoryInventory {
    pub directory: String,
    pub format: InventoryFormat,
    pub records: Vec<RawRecord>,
}

impl RawDirectoryInventory {
    pub fn new(directory: impl Into<String>, entries: RawEntries) -> Self {
        Self {
            directory: directory.into(),
            format: entries.format,
            records: entries.records,
        }
    }

    /// Parse JSON text in either form.
    pub fn from_json(directory: impl Into<String>, content: &str) -> serde_json::Result<Self> {
        let entries: RawEntries = serde_json::from_str(content)?;
        Ok(Self::new(directory, entries))
    }

    /// Build from a crawl. Every file gets `verified_at`, since its checksum
    /// was just computed.
    pub fn from_scan(directory: impl Into<String>, outcome: &ScanOutcome, verified_at: DateTime<Utc>) -> Self {
        let stamp = format_verified_at(&verified_at);
        let records = outcome
            .files
            .iter()
            .map(|file| RawRecord {
                path: file.name.clone(),
                size: Some(i64::try_from(file.size).unwrap_or(i64::MAX)),
                checksum: Some(file.checksum.clone()),
                verified_at: Some(stamp.clone()),
                ..RawRecord::default()
            })
            .collect();
        Self {
            directory: directory.into(),
            format: InventoryFormat::Keyed,
            records,
        }
    }
}

/// Merged inventory document as read.
#[derive(Debug, Deserialize)]
pub struct RawMergedInventory {
    pub format: String,
    pub tree_root: String,
    pub generated_at: DateTime<Utc>,
    pub records: RawEntries,
}

impl RawMergedInventory {
    /// Wrap a bare list of root-relative entries, the layout older merge
    /// tools wrote, in the current document shape.
    pub fn from_entries(tree_root: impl Into<String>, generated_at: DateTime<Utc>, records: RawEntries) -> Self {
        Self {
            format: MERGED_FORMAT.to_string(),
            tree_root: tree_root.into(),
            generated_at,
            records,
        }
    }
}

/// Keyed-form body written for a record. The path is the map key.
#[derive(Serialize)]
struct RecordBody<'a> {
    size: u64,
    checksum: &'a Checksum,
    #[serde(serialize_with = "serialize_captured", skip_serializing_if = "Option::is_none")]
    captured_at: Option<chrono::NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(serialize_with = "serialize_verified", skip_serializing_if = "Option::is_none")]
    verified_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a InventoryRecord> for RecordBody<'a> {
    fn from(record: &'a InventoryRecord) -> Self {
        Self {
            size: record.size,
            checksum: &record.checksum,
            captured_at: record.captured_at,
            width: record.dimensions.map(|d| d.width),
            height: record.dimensions.map(|d| d.height),
            verified_at: record.verified_at,
        }
    }
}

/// Serialize records in keyed form.
pub(crate) fn serialize_keyed<'a, S, I>(records: I, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    I: IntoIterator<Item = &'a InventoryRecord>,
{
    serializer.collect_map(
        records
            .into_iter()
            .map(|record| (record.path.as_str(), RecordBody::from(record))),
    )
}
