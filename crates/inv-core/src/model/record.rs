//! Inventory records

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};

use super::Checksum;
use super::timestamp::{format_captured_at, format_verified_at};

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse the `WxH` form used by list-form inventories.
    pub fn parse(value: &str) -> Option<Self> {
        let (w, h) = value.trim().split_once(['x', 'X'])?;
        let width = w.trim().parse().ok()?;
        let height = h.trim().parse().ok()?;
        (width > 0 && height > 0).then_some(Self { width, height })
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Tracked identity of one file.
///
/// `path` is relative to the owning directory inside a
/// [`DirectoryInventory`](super::DirectoryInventory) and relative to the tree
/// root inside a [`MergedInventory`](super::MergedInventory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRecord {
    pub path: String,
    pub size: u64,
    pub checksum: Checksum,
    #[serde(serialize_with = "serialize_captured", skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(serialize_with = "serialize_verified", skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

impl InventoryRecord {
    pub fn new(path: impl Into<String>, size: u64, checksum: Checksum) -> Self {
        Self {
            path: path.into(),
            size,
            checksum,
            captured_at: None,
            dimensions: None,
            verified_at: None,
        }
    }

    pub fn with_captured_at(mut self, captured_at: NaiveDateTime) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(Dimensions::new(width, height));
        self
    }

    pub fn with_verified_at(mut self, verified_at: DateTime<Utc>) -> Self {
        self.verified_at = Some(verified_at);
        self
    }

    /// Same bytes: equal checksum and equal size.
    pub fn same_content(&self, other: &InventoryRecord) -> bool {
        self.checksum == other.checksum && self.size == other.size
    }

    /// Same descriptive metadata. Verification time is not compared.
    pub fn same_metadata(&self, other: &InventoryRecord) -> bool {
        self.captured_at == other.captured_at && self.dimensions == other.dimensions
    }

    /// Has both capture date and dimensions.
    pub fn is_complete(&self) -> bool {
        self.captured_at.is_some() && self.dimensions.is_some()
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Copy of this record under another path.
    pub fn rebased(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }
}

pub(crate) fn serialize_captured<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_str(&format_captured_at(v)),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn serialize_verified<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_str(&format_verified_at(v)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> InventoryRecord {
        InventoryRecord::new(path, 10, Checksum::of_bytes(path.as_bytes()))
    }

    #[test]
    fn dimensions_parse() {
        assert_eq!(Dimensions::parse("4000x3000"), Some(Dimensions::new(4000, 3000)));
        assert_eq!(Dimensions::parse(" 640 X 480 "), Some(Dimensions::new(640, 480)));
        assert_eq!(Dimensions::parse("0x480"), None);
        assert_eq!(Dimensions::parse("640"), None);
        assert_eq!(Dimensions::new(1, 2).to_string(), "1x2");
    }

    #[test]
    fn metadata_comparison_ignores_verification_time() {
        let a = record("a.jpg");
        let b = a.clone().with_verified_at(Utc::now());
        assert!(a.same_content(&b));
        assert!(a.same_metadata(&b));

        let c = a.clone().with_dimensions(1, 1);
        assert!(!a.same_metadata(&c));
    }

    #[test]
    fn file_name_and_rebase() {
        let r = record("2019/trip/a.jpg");
        assert_eq!(r.file_name(), "a.jpg");
        assert_eq!(r.rebased("x/a.jpg").path, "x/a.jpg");
        assert_eq!(r.rebased("x/a.jpg").checksum, r.checksum);
    }

    #[test]
    fn json_omits_absent_metadata() {
        let json = serde_json::to_value(record("a.jpg")).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("captured_at"));
        assert!(!object.contains_key("dimensions"));
        assert_eq!(object["size"], 10);
    }
}
