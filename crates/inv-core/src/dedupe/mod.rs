//! Dedupe analyzer
//!
//! Groups records by checksum and suggests which copies could go. Nothing
//! is deleted here; the result is a report that can be rendered into
//! removal commands for someone to review.

mod policy;

pub use policy::{CameraNameScore, ShortestPath, SurvivorPolicy, SurvivorPolicyKind, filename_score};

use std::collections::BTreeMap;

use inv_fs::{join_relative, parent_of};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::{Checksum, DirectoryInventory, InventoryRecord, MergedInventory};

/// Anything that can list records with paths unique to one file on disk.
///
/// A single tree lists root-relative paths. Several snapshots list paths
/// prefixed with their tree root, so the same relative path on two disks
/// stays two records.
pub trait RecordSource {
    fn rooted_records(&self) -> Vec<InventoryRecord>;
}

impl RecordSource for MergedInventory {
    fn rooted_records(&self) -> Vec<InventoryRecord> {
        self.records().cloned().collect()
    }
}

impl RecordSource for DirectoryInventory {
    fn rooted_records(&self) -> Vec<InventoryRecord> {
        DirectoryInventory::rooted_records(self).collect()
    }
}

impl RecordSource for [DirectoryInventory] {
    fn rooted_records(&self) -> Vec<InventoryRecord> {
        self.iter()
            .flat_map(DirectoryInventory::rooted_records)
            .collect()
    }
}

impl RecordSource for Vec<DirectoryInventory> {
    fn rooted_records(&self) -> Vec<InventoryRecord> {
        self.as_slice().rooted_records()
    }
}

impl RecordSource for [MergedInventory] {
    fn rooted_records(&self) -> Vec<InventoryRecord> {
        self.iter()
            .flat_map(|m| {
                m.records()
                    .map(|r| r.rebased(under_root(m.tree_root(), &r.path)))
            })
            .collect()
    }
}

fn under_root(root: &str, path: &str) -> String {
    if root == "/" {
        format!("/{path}")
    } else {
        join_relative(root, path)
    }
}

impl RecordSource for Vec<MergedInventory> {
    fn rooted_records(&self) -> Vec<InventoryRecord> {
        self.as_slice().rooted_records()
    }
}

/// A proposal to remove one redundant copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalSuggestion {
    pub path: String,
    /// The copy that stays
    pub survivor: String,
    pub checksum: Checksum,
    pub size: u64,
}

/// Records sharing one checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupeGroup {
    pub checksum: Checksum,
    pub size: u64,
    pub survivor: InventoryRecord,
    /// Path order
    pub removable: Vec<InventoryRecord>,
    /// False when the policy found nothing to tell the survivor from the
    /// runner-up and fell back to path order
    pub clear_choice: bool,
}

impl DedupeGroup {
    /// Number of records in the group, survivor included.
    pub fn member_count(&self) -> usize {
        self.removable.len() + 1
    }

    pub fn members(&self) -> impl Iterator<Item = &InventoryRecord> {
        std::iter::once(&self.survivor).chain(self.removable.iter())
    }

    pub fn removals(&self) -> impl Iterator<Item = RemovalSuggestion> + '_ {
        self.removable.iter().map(|record| RemovalSuggestion {
            path: record.path.clone(),
            survivor: self.survivor.path.clone(),
            checksum: self.checksum.clone(),
            size: self.size,
        })
    }
}

/// Records sharing a checksum but not a size. The digest is trusted to
/// identify content, so this points at a damaged inventory rather than
/// at duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumSizeMismatch {
    pub checksum: Checksum,
    pub records: Vec<InventoryRecord>,
}

/// Duplicate count for one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryDuplicates {
    pub directory: String,
    pub count: usize,
}

/// Result of [`find_duplicates`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupeReport {
    /// Distinct paths examined
    pub records_examined: usize,
    /// Sorted by checksum
    pub groups: Vec<DedupeGroup>,
    /// Sorted by checksum
    pub anomalies: Vec<ChecksumSizeMismatch>,
}

impl DedupeReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.anomalies.is_empty()
    }

    pub fn removals(&self) -> Vec<RemovalSuggestion> {
        self.groups.iter().flat_map(DedupeGroup::removals).collect()
    }

    /// Groups whose survivor was picked by path order alone.
    pub fn unclear_groups(&self) -> impl Iterator<Item = &DedupeGroup> {
        self.groups.iter().filter(|g| !g.clear_choice)
    }

    /// Bytes freed if every suggestion were carried out.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups
            .iter()
            .map(|g| g.size * g.removable.len() as u64)
            .sum()
    }

    /// How many duplicated records each directory holds, most first.
    pub fn duplicates_per_directory(&self) -> Vec<DirectoryDuplicates> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in self.groups.iter().flat_map(DedupeGroup::members) {
            *counts.entry(parent_of(&record.path)).or_default() += 1;
        }
        let mut summary: Vec<DirectoryDuplicates> = counts
            .into_iter()
            .map(|(directory, count)| DirectoryDuplicates {
                directory: directory.to_string(),
                count,
            })
            .collect();
        summary.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.directory.cmp(&b.directory)));
        summary
    }
}

/// Find records that share content.
pub fn find_duplicates<S, P>(source: &S, policy: &P) -> DedupeReport
where
    S: RecordSource + ?Sized,
    P: SurvivorPolicy + ?Sized,
{
    let mut by_path: BTreeMap<String, InventoryRecord> = BTreeMap::new();
    for record in source.rooted_records() {
        if by_path.contains_key(&record.path) {
            debug!(path = %record.path, "path listed more than once; counting it once");
            continue;
        }
        by_path.insert(record.path.clone(), record);
    }
    let records_examined = by_path.len();

    let mut by_checksum: BTreeMap<Checksum, Vec<InventoryRecord>> = BTreeMap::new();
    for record in by_path.into_values() {
        by_checksum.entry(record.checksum.clone()).or_default().push(record);
    }

    let mut report = DedupeReport {
        records_examined,
        ..DedupeReport::default()
    };

    for (checksum, mut records) in by_checksum {
        if records.len() < 2 {
            continue;
        }
        let size = records[0].size;
        if records.iter().any(|r| r.size != size) {
            warn!(checksum = %checksum, records = records.len(), "same checksum with different sizes");
            report.anomalies.push(ChecksumSizeMismatch { checksum, records });
            continue;
        }

        records.sort_by(|a, b| policy.compare(a, b));
        let clear_choice = policy.is_decisive(&records[0], &records[1]);
        let survivor = records.remove(0);
        records.sort_by(|a, b| a.path.cmp(&b.path));
        if !clear_choice {
            warn!(
                checksum = %checksum,
                survivor = %survivor.path,
                policy = policy.name(),
                "no clear survivor; kept by path order"
            );
        }
        debug!(
            checksum = %checksum,
            survivor = %survivor.path,
            removable = records.len(),
            policy = policy.name(),
            "duplicate group"
        );
        report.groups.push(DedupeGroup {
            checksum,
            size,
            survivor,
            removable: records,
            clear_choice,
        });
    }

    info!(
        records = records_examined,
        groups = report.groups.len(),
        removable = report.groups.iter().map(|g| g.removable.len()).sum::<usize>(),
        reclaimable_bytes = report.reclaimable_bytes(),
        "duplicate analysis finished"
    );
    report
}
