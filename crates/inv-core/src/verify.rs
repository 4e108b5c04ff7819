//! Inventory verification
//!
//! Compares a stored inventory with a fresh one for the same directory.
//! Additions and removals of whitelisted extensions can be approved up
//! front; content changes are always problems, metadata changes never are.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::{DirectoryInventory, InventoryRecord};
use inv_fs::path::dotted_extension;

/// Extensions whose appearance or disappearance is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalRules {
    approve_add: Vec<String>,
    approve_remove: Vec<String>,
}

impl ApprovalRules {
    /// Extensions are matched case-insensitively; a missing leading dot is
    /// added.
    pub fn new<A, R>(approve_add: A, approve_remove: R) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        Self {
            approve_add: approve_add.into_iter().map(normalize_extension).collect(),
            approve_remove: approve_remove.into_iter().map(normalize_extension).collect(),
        }
    }

    pub fn approves_add(&self, path: &str) -> bool {
        matches_extension(path, &self.approve_add)
    }

    pub fn approves_remove(&self, path: &str) -> bool {
        matches_extension(path, &self.approve_remove)
    }
}

fn normalize_extension(ext: impl AsRef<str>) -> String {
    let ext = ext.as_ref().trim().to_lowercase();
    if ext.starts_with('.') { ext } else { format!(".{ext}") }
}

fn matches_extension(path: &str, list: &[String]) -> bool {
    dotted_extension(path).is_some_and(|ext| list.contains(&ext))
}

/// One difference between the stored and the fresh inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum InventoryChange {
    Added { record: InventoryRecord, approved: bool },
    Removed { record: InventoryRecord, approved: bool },
    /// Size or checksum differs
    ContentChanged { old: InventoryRecord, new: InventoryRecord },
    /// Only capture date or dimensions differ
    MetadataChanged { old: InventoryRecord, new: InventoryRecord },
}

impl InventoryChange {
    pub fn path(&self) -> &str {
        match self {
            Self::Added { record, .. } | Self::Removed { record, .. } => &record.path,
            Self::ContentChanged { old, .. } | Self::MetadataChanged { old, .. } => &old.path,
        }
    }

    pub fn is_problem(&self) -> bool {
        match self {
            Self::Added { approved, .. } | Self::Removed { approved, .. } => !approved,
            Self::ContentChanged { .. } => true,
            Self::MetadataChanged { .. } => false,
        }
    }
}

impl std::fmt::Display for InventoryChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added { record, approved } => {
                write!(f, "new file '{}'", record.path)?;
                if *approved {
                    f.write_str(" (approved)")?;
                }
                Ok(())
            }
            Self::Removed { record, approved } => {
                write!(f, "missing file '{}'", record.path)?;
                if *approved {
                    f.write_str(" (approved)")?;
                }
                Ok(())
            }
            Self::ContentChanged { old, new } if old.size != new.size => write!(
                f,
                "size mismatch for '{}' (old {}, new {})",
                old.path, old.size, new.size
            ),
            Self::ContentChanged { old, new } => write!(
                f,
                "checksum mismatch for '{}' (old {}, new {})",
                old.path,
                old.checksum.short(),
                new.checksum.short()
            ),
            Self::MetadataChanged { old, .. } => write!(f, "metadata changed for '{}'", old.path),
        }
    }
}

/// Overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyStatus {
    /// No differences at all
    Matched,
    /// Only metadata changes or approved additions/removals
    Accepted,
    /// At least one problem
    Differences,
}

/// Result of [`compare_inventories`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub directory: String,
    pub status: VerifyStatus,
    /// Path order
    pub changes: Vec<InventoryChange>,
}

impl VerifyReport {
    pub fn problems(&self) -> Vec<&InventoryChange> {
        self.changes.iter().filter(|c| c.is_problem()).collect()
    }
}

/// Compare a stored inventory (`old`) with a fresh one (`new`).
pub fn compare_inventories(
    old: &DirectoryInventory,
    new: &DirectoryInventory,
    rules: &ApprovalRules,
) -> VerifyReport {
    let mut changes = Vec::new();
    let mut shared = 0usize;

    for record in old.records() {
        match new.get(&record.path) {
            Some(fresh) => {
                shared += 1;
                if !record.same_content(fresh) {
                    changes.push(InventoryChange::ContentChanged {
                        old: record.clone(),
                        new: fresh.clone(),
                    });
                } else if !record.same_metadata(fresh) {
                    changes.push(InventoryChange::MetadataChanged {
                        old: record.clone(),
                        new: fresh.clone(),
                    });
                }
            }
            None => changes.push(InventoryChange::Removed {
                approved: rules.approves_remove(&record.path),
                record: record.clone(),
            }),
        }
    }
    for record in new.records().filter(|r| old.get(&r.path).is_none()) {
        changes.push(InventoryChange::Added {
            approved: rules.approves_add(&record.path),
            record: record.clone(),
        });
    }
    changes.sort_by(|a, b| a.path().cmp(b.path()));

    if shared == 0 && !old.is_empty() && !new.is_empty() {
        warn!(
            directory = old.directory(),
            "inventories share no paths; perhaps the directories do not match"
        );
    }

    let status = if changes.is_empty() {
        VerifyStatus::Matched
    } else if changes.iter().any(InventoryChange::is_problem) {
        VerifyStatus::Differences
    } else {
        VerifyStatus::Accepted
    };

    for change in &changes {
        if change.is_problem() {
            info!(directory = old.directory(), "{}", change);
        } else {
            debug!(directory = old.directory(), "{}", change);
        }
    }

    VerifyReport {
        directory: new.directory().to_string(),
        status,
        changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Checksum;
    use rstest::rstest;

    fn inv(files: &[(&str, &[u8])]) -> DirectoryInventory {
        let mut inv = DirectoryInventory::new("d");
        for (name, content) in files {
            inv.insert(InventoryRecord::new(
                *name,
                content.len() as u64,
                Checksum::of_bytes(content),
            ));
        }
        inv
    }

    #[test]
    fn identical_inventories_match() {
        let a = inv(&[("a.jpg", b"a")]);
        let report = compare_inventories(&a, &a.clone(), &ApprovalRules::default());
        assert_eq!(report.status, VerifyStatus::Matched);
        assert!(report.problems().is_empty());
    }

    #[test]
    fn content_change_is_always_a_problem() {
        let rules = ApprovalRules::new([".jpg"], [".jpg"]);
        let report = compare_inventories(&inv(&[("a.jpg", b"a")]), &inv(&[("a.jpg", b"b")]), &rules);
        assert_eq!(report.status, VerifyStatus::Differences);
        assert_eq!(report.problems()[0].to_string(), format!(
            "checksum mismatch for 'a.jpg' (old {}, new {})",
            Checksum::of_bytes(b"a").short(),
            Checksum::of_bytes(b"b").short()
        ));
    }

    #[rstest]
    #[case(&["jpg"], &[], VerifyStatus::Differences)]
    #[case(&["JPG"], &[".mov"], VerifyStatus::Accepted)]
    #[case(&[], &[], VerifyStatus::Differences)]
    fn approvals(#[case] add: &[&str], #[case] remove: &[&str], #[case] expected: VerifyStatus) {
        let old = inv(&[("keep.jpg", b"k"), ("clip.mov", b"m")]);
        let new = inv(&[("keep.jpg", b"k"), ("new.jpg", b"n")]);
        let report = compare_inventories(&old, &new, &ApprovalRules::new(add, remove));
        assert_eq!(report.status, expected);
        assert_eq!(report.changes.len(), 2);
    }

    #[test]
    fn metadata_only_changes_are_accepted() {
        let old = inv(&[("a.jpg", b"a")]);
        let mut new = DirectoryInventory::new("d");
        new.insert(old.get("a.jpg").unwrap().clone().with_dimensions(2, 2));
        let report = compare_inventories(&old, &new, &ApprovalRules::default());
        assert_eq!(report.status, VerifyStatus::Accepted);
    }
}
