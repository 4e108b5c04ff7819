//! Inventory validation
//!
//! Turns raw wire entries into typed records. Every problem in a document is
//! collected before failing so one run shows the full extent of the damage.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use inv_fs::{PathIssue, check_relative};
use tracing::{debug, warn};

use crate::model::timestamp::{CaptureDate, parse_captured_at, parse_verified_at};
use crate::model::{
    Checksum, Dimensions, DirectoryInventory, InventoryRecord, MERGED_FORMAT, MergedInventory,
    RawDirectoryInventory, RawMergedInventory, RawRecord,
};
use crate::{Error, Result};

/// Options for [`validate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// The inventory claims to be complete: every record must carry a
    /// capture date and dimensions.
    pub require_complete: bool,
}

/// What is wrong with one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    DuplicatePath,
    NegativeSize { size: i64 },
    MalformedChecksum { value: String },
    InvalidPath { reason: PathIssue },
    MalformedTimestamp { field: &'static str, value: String },
    PartialDimensions { width: Option<i64>, height: Option<i64> },
    MissingField { field: &'static str },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePath => write!(f, "path appears more than once"),
            Self::NegativeSize { size } => write!(f, "negative size {size}"),
            Self::MalformedChecksum { value } => write!(f, "malformed checksum '{value}'"),
            Self::InvalidPath { reason } => write!(f, "{reason}"),
            Self::MalformedTimestamp { field, value } => {
                write!(f, "unparseable {field} '{value}'")
            }
            Self::PartialDimensions { width, height } => {
                let show = |v: &Option<i64>| v.map_or_else(|| "-".to_string(), |n| n.to_string());
                write!(f, "incomplete dimensions {}x{}", show(width), show(height))
            }
            Self::MissingField { field } => write!(f, "missing {field}"),
        }
    }
}

/// One problem found during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path of the offending entry as written in the document
    pub path: String,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.path, self.kind)
    }
}

/// Validate a per-directory inventory.
///
/// # Errors
///
/// [`Error::MalformedInventory`] listing every issue found.
pub fn validate(raw: RawDirectoryInventory, options: ValidationOptions) -> Result<DirectoryInventory> {
    let records = validate_records(&raw.directory, raw.records, options)?;
    debug!(
        directory = %raw.directory,
        records = records.len(),
        format = ?raw.format,
        "validated inventory"
    );
    Ok(DirectoryInventory::from_parts(raw.directory, raw.format, records))
}

/// Validate a merged inventory document.
pub fn validate_merged(raw: RawMergedInventory, options: ValidationOptions) -> Result<MergedInventory> {
    if raw.format != MERGED_FORMAT {
        return Err(Error::UnsupportedMergedFormat { format: raw.format });
    }
    let records = validate_records("", raw.records.records, options)?;
    debug!(tree_root = %raw.tree_root, records = records.len(), "validated merged inventory");
    Ok(MergedInventory::from_parts(raw.tree_root, raw.generated_at, records))
}

fn validate_records(
    directory: &str,
    raw: Vec<RawRecord>,
    options: ValidationOptions,
) -> Result<BTreeMap<String, InventoryRecord>> {
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();
    let mut records = BTreeMap::new();

    for entry in raw {
        if !seen.insert(entry.path.clone()) {
            issues.push(ValidationIssue {
                path: entry.path.clone(),
                kind: IssueKind::DuplicatePath,
            });
            continue;
        }
        if let Some(record) = validate_record(directory, entry, options, &mut issues) {
            records.insert(record.path.clone(), record);
        }
    }

    if issues.is_empty() {
        Ok(records)
    } else {
        Err(Error::MalformedInventory {
            directory: directory.to_string(),
            issues,
        })
    }
}

fn validate_record(
    directory: &str,
    raw: RawRecord,
    options: ValidationOptions,
    issues: &mut Vec<ValidationIssue>,
) -> Option<InventoryRecord> {
    let before = issues.len();
    let mut issue = |kind: IssueKind| {
        issues.push(ValidationIssue {
            path: raw.path.clone(),
            kind,
        })
    };

    if let Err(reason) = check_relative(&raw.path) {
        issue(IssueKind::InvalidPath { reason });
    }

    let size = match raw.size {
        None => {
            issue(IssueKind::MissingField { field: "size" });
            None
        }
        Some(size) if size < 0 => {
            issue(IssueKind::NegativeSize { size });
            None
        }
        Some(size) => u64::try_from(size).ok(),
    };

    let checksum = match raw.checksum.as_deref() {
        None => {
            issue(IssueKind::MissingField { field: "checksum" });
            None
        }
        Some(value) => {
            let parsed = Checksum::parse(value);
            if parsed.is_none() {
                issue(IssueKind::MalformedChecksum {
                    value: value.to_string(),
                });
            }
            parsed
        }
    };

    let captured_at = match raw.captured_at.as_deref() {
        None => None,
        Some(value) => match parse_captured_at(value) {
            CaptureDate::Valid(at) => Some(at),
            CaptureDate::Implausible => {
                warn!(
                    directory,
                    path = %raw.path,
                    value,
                    "ignoring obviously incorrect capture date"
                );
                None
            }
            CaptureDate::Malformed => {
                issue(IssueKind::MalformedTimestamp {
                    field: "captured_at",
                    value: value.to_string(),
                });
                None
            }
        },
    };

    let verified_at = match raw.verified_at.as_deref() {
        None => None,
        Some(value) => {
            let parsed = parse_verified_at(value);
            if parsed.is_none() {
                issue(IssueKind::MalformedTimestamp {
                    field: "verified_at",
                    value: value.to_string(),
                });
            }
            parsed
        }
    };

    let dimensions = match (raw.width, raw.height) {
        (None, None) => None,
        (Some(w), Some(h)) if w > 0 && h > 0 => match (u32::try_from(w), u32::try_from(h)) {
            (Ok(width), Ok(height)) => Some(Dimensions::new(width, height)),
            _ => {
                issue(IssueKind::PartialDimensions {
                    width: Some(w),
                    height: Some(h),
                });
                None
            }
        },
        (width, height) => {
            issue(IssueKind::PartialDimensions { width, height });
            None
        }
    };

    if options.require_complete {
        if raw.captured_at.is_none() {
            issue(IssueKind::MissingField {
                field: "captured_at",
            });
        }
        if raw.width.is_none() && raw.height.is_none() {
            issue(IssueKind::MissingField {
                field: "dimensions",
            });
        }
    }

    if issues.len() > before {
        return None;
    }

    Some(InventoryRecord {
        path: raw.path,
        size: size?,
        checksum: checksum?,
        captured_at,
        dimensions,
        verified_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawEntries;
    use pretty_assertions::assert_eq;

    const HEX: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn raw(records: Vec<RawRecord>) -> RawDirectoryInventory {
        RawDirectoryInventory::new(
            "2019",
            RawEntries {
                records,
                ..RawEntries::default()
            },
        )
    }

    fn kinds(err: Error) -> Vec<IssueKind> {
        err.issues().iter().map(|i| i.kind.clone()).collect()
    }

    #[test]
    fn valid_inventory_passes() {
        let mut b = RawRecord::new("b.jpg", 20, HEX.to_uppercase());
        b.captured_at = Some("2019:07:04 12:30:00".into());
        b.width = Some(4000);
        b.height = Some(3000);
        let inv = validate(raw(vec![b, RawRecord::new("a.jpg", 10, HEX)]), ValidationOptions::default())
            .unwrap();

        assert_eq!(inv.directory(), "2019");
        assert_eq!(inv.paths().collect::<Vec<_>>(), vec!["a.jpg", "b.jpg"]);
        let b = inv.get("b.jpg").unwrap();
        assert_eq!(b.checksum.as_str(), HEX);
        assert_eq!(b.dimensions, Some(Dimensions::new(4000, 3000)));
    }

    #[test]
    fn every_issue_is_collected() {
        let mut partial = RawRecord::new("d.jpg", 1, HEX);
        partial.width = Some(10);
        let mut bad_date = RawRecord::new("e.jpg", 1, HEX);
        bad_date.captured_at = Some("last tuesday".into());

        let err = validate(
            raw(vec![
                RawRecord::new("a.jpg", -1, HEX),
                RawRecord::new("b.jpg", 1, "xyz"),
                RawRecord::new("../c.jpg", 1, HEX),
                partial,
                bad_date,
                RawRecord::new("f.jpg", 1, HEX),
                RawRecord::new("f.jpg", 2, HEX),
            ]),
            ValidationOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(&err, Error::MalformedInventory { directory, .. } if directory == "2019"));
        assert_eq!(
            kinds(err),
            vec![
                IssueKind::NegativeSize { size: -1 },
                IssueKind::MalformedChecksum { value: "xyz".into() },
                IssueKind::InvalidPath {
                    reason: PathIssue::DotSegment
                },
                IssueKind::PartialDimensions {
                    width: Some(10),
                    height: None
                },
                IssueKind::MalformedTimestamp {
                    field: "captured_at",
                    value: "last tuesday".into()
                },
                IssueKind::DuplicatePath,
            ]
        );
    }

    #[test]
    fn implausible_capture_date_is_dropped_not_rejected() {
        let mut old = RawRecord::new("a.jpg", 1, HEX);
        old.captured_at = Some("1980-01-01 00:00:00".into());
        let inv = validate(raw(vec![old]), ValidationOptions::default()).unwrap();
        assert_eq!(inv.get("a.jpg").unwrap().captured_at, None);
    }

    #[test]
    fn complete_inventories_need_metadata() {
        let err = validate(
            raw(vec![RawRecord::new("a.jpg", 1, HEX)]),
            ValidationOptions {
                require_complete: true,
            },
        )
        .unwrap_err();
        assert_eq!(
            kinds(err),
            vec![
                IssueKind::MissingField {
                    field: "captured_at"
                },
                IssueKind::MissingField {
                    field: "dimensions"
                },
            ]
        );
    }

    #[test]
    fn missing_required_fields() {
        let err = validate(
            raw(vec![RawRecord {
                path: "a.jpg".into(),
                ..RawRecord::default()
            }]),
            ValidationOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            kinds(err),
            vec![
                IssueKind::MissingField { field: "size" },
                IssueKind::MissingField { field: "checksum" },
            ]
        );
    }

    #[test]
    fn zero_dimension_is_partial() {
        let mut r = RawRecord::new("a.jpg", 1, HEX);
        r.width = Some(0);
        r.height = Some(10);
        let err = validate(raw(vec![r]), ValidationOptions::default()).unwrap_err();
        assert_eq!(
            kinds(err),
            vec![IssueKind::PartialDimensions {
                width: Some(0),
                height: Some(10)
            }]
        );
    }

    #[test]
    fn merged_format_marker_is_checked() {
        let raw = RawMergedInventory {
            format: "merged-v9".into(),
            tree_root: "/photos".into(),
            generated_at: chrono::Utc::now(),
            records: RawEntries::default(),
        };
        let err = validate_merged(raw, ValidationOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMergedFormat { .. }));
    }
}
