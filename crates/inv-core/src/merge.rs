//! Merge engine
//!
//! Combines per-directory inventories into one tree-wide snapshot. Paths
//! claimed by more than one input are conflicts: every claimant is left
//! out of the result and reported, while all other records are kept.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::{DirectoryInventory, InventoryRecord, MergedInventory};

/// One input's claim on a contested path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictClaim {
    /// Directory of the inventory making the claim
    pub directory: String,
    /// The claiming record, path relative to `directory`
    pub record: InventoryRecord,
}

/// A root-relative path produced by more than one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeConflict {
    pub path: String,
    /// Sorted by directory
    pub claims: Vec<ConflictClaim>,
}

/// Mismatch between the inventories supplied and the directories present.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoverageWarning {
    /// Directory exists but has no inventory
    MissingInventory { directory: String },
    /// Inventory exists for a directory that is not in the listing
    UnlistedInventory { directory: String },
}

impl CoverageWarning {
    pub fn directory(&self) -> &str {
        match self {
            Self::MissingInventory { directory } | Self::UnlistedInventory { directory } => directory,
        }
    }
}

impl std::fmt::Display for CoverageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInventory { directory } => {
                write!(f, "directory '{directory}' has no inventory")
            }
            Self::UnlistedInventory { directory } => {
                write!(f, "inventory for '{directory}' has no matching directory")
            }
        }
    }
}

/// A directory whose inventory could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryFailure {
    pub directory: String,
    pub message: String,
}

/// Result of a merge: the snapshot plus everything worth reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub inventory: MergedInventory,
    /// Sorted by path
    pub conflicts: Vec<MergeConflict>,
    /// Sorted
    pub coverage: Vec<CoverageWarning>,
    /// Sorted by directory; filled by the tree loader
    pub failures: Vec<DirectoryFailure>,
}

impl MergeOutcome {
    /// No conflicts, coverage warnings or failures.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.coverage.is_empty() && self.failures.is_empty()
    }

    /// Attach loader failures, keeping them sorted.
    pub fn with_failures(mut self, mut failures: Vec<DirectoryFailure>) -> Self {
        failures.sort_by(|a, b| a.directory.cmp(&b.directory));
        self.failures = failures;
        self
    }
}

/// Merge inventories without a coverage check.
pub fn merge<'a, I>(tree_root: &str, inventories: I) -> MergeOutcome
where
    I: IntoIterator<Item = &'a DirectoryInventory>,
{
    merge_inner(tree_root, inventories, None)
}

/// Merge inventories and compare them against the directories present in
/// the tree.
pub fn merge_with_listing<'a, I, D>(tree_root: &str, inventories: I, present_directories: D) -> MergeOutcome
where
    I: IntoIterator<Item = &'a DirectoryInventory>,
    D: IntoIterator,
    D::Item: AsRef<str>,
{
    let listing: BTreeSet<String> = present_directories
        .into_iter()
        .map(|d| d.as_ref().trim_matches('/').to_string())
        .collect();
    merge_inner(tree_root, inventories, Some(&listing))
}

fn merge_inner<'a, I>(tree_root: &str, inventories: I, listing: Option<&BTreeSet<String>>) -> MergeOutcome
where
    I: IntoIterator<Item = &'a DirectoryInventory>,
{
    let mut claims: BTreeMap<String, Vec<ConflictClaim>> = BTreeMap::new();
    let mut covered = BTreeSet::new();

    for inventory in inventories {
        debug!(
            directory = inventory.directory(),
            records = inventory.len(),
            "merging directory inventory"
        );
        covered.insert(inventory.directory().to_string());
        for record in inventory.records() {
            claims
                .entry(inventory.rooted_path(&record.path))
                .or_default()
                .push(ConflictClaim {
                    directory: inventory.directory().to_string(),
                    record: record.clone(),
                });
        }
    }

    let mut records = BTreeMap::new();
    let mut conflicts = Vec::new();
    for (path, mut claimants) in claims {
        if claimants.len() == 1 {
            let claim = claimants.remove(0);
            records.insert(path.clone(), claim.record.rebased(path));
        } else {
            claimants.sort_by(|a, b| {
                a.directory
                    .cmp(&b.directory)
                    .then_with(|| a.record.path.cmp(&b.record.path))
                    .then_with(|| a.record.checksum.cmp(&b.record.checksum))
            });
            warn!(path = %path, claims = claimants.len(), "path claimed by several inventories");
            conflicts.push(MergeConflict {
                path,
                claims: claimants,
            });
        }
    }

    let mut coverage = Vec::new();
    if let Some(listing) = listing {
        for directory in listing.difference(&covered) {
            coverage.push(CoverageWarning::MissingInventory {
                directory: directory.clone(),
            });
        }
        for directory in covered.difference(listing) {
            coverage.push(CoverageWarning::UnlistedInventory {
                directory: directory.clone(),
            });
        }
        coverage.sort();
        for warning in &coverage {
            warn!(directory = warning.directory(), "{}", warning);
        }
    }

    info!(
        tree_root,
        records = records.len(),
        conflicts = conflicts.len(),
        coverage_warnings = coverage.len(),
        "merged inventories"
    );

    MergeOutcome {
        inventory: MergedInventory::from_parts(tree_root, Utc::now(), records),
        conflicts,
        coverage,
        failures: Vec::new(),
    }
}
