//! Two-way snapshot diff
//!
//! Every path present on either side ends up in exactly one decision.
//! Shared paths are compared record to record. Unshared paths are grouped
//! by checksum so content that moved is recognised as a move instead of a
//! copy plus a delete, and content already present elsewhere on the
//! missing side becomes a local copy instead of a transfer.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::SyncDecision;
use crate::dedupe::ShortestPath;
use crate::model::{Checksum, InventoryRecord, MergedInventory, Side};
use crate::{Error, Result};

/// Chooses the canonical path of a detected move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MovePolicy {
    /// The path preferred by [`ShortestPath`] is canonical, whichever side
    /// holds it. Symmetric under swapping sides.
    #[default]
    PreferredPath,
    /// The given side's path is canonical; the other side renames.
    Canonical(Side),
}

impl MovePolicy {
    /// Side that renames for a move between `left_path` and `right_path`.
    pub fn rename_on(self, left_path: &str, right_path: &str) -> Side {
        match self {
            Self::PreferredPath => {
                if ShortestPath::compare_paths(left_path, right_path).is_le() {
                    Side::Right
                } else {
                    Side::Left
                }
            }
            Self::Canonical(side) => side.other(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreferredPath => "preferred-path",
            Self::Canonical(Side::Left) => "canonical-left",
            Self::Canonical(Side::Right) => "canonical-right",
        }
    }
}

impl fmt::Display for MovePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "preferred-path" => Ok(Self::PreferredPath),
            "canonical-left" => Ok(Self::Canonical(Side::Left)),
            "canonical-right" => Ok(Self::Canonical(Side::Right)),
            other => Err(Error::UnknownPolicy {
                kind: "move",
                name: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for MovePolicy {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MovePolicy> for String {
    fn from(value: MovePolicy) -> Self {
        value.as_str().to_string()
    }
}

/// Options for [`diff_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    pub move_policy: MovePolicy,
}

/// Diff two snapshots with default policies.
pub fn diff(left: &MergedInventory, right: &MergedInventory) -> Vec<SyncDecision> {
    diff_with(left, right, &DiffOptions::default())
}

/// Diff two snapshots.
///
/// Decisions are ordered by the smallest path each one covers.
pub fn diff_with(left: &MergedInventory, right: &MergedInventory, options: &DiffOptions) -> Vec<SyncDecision> {
    let mut decisions = Vec::new();

    for record in left.records() {
        if let Some(other) = right.get(&record.path) {
            decisions.push(compare_shared(record, other));
        }
    }

    let left_only = unshared_by_checksum(left, right);
    let right_only = unshared_by_checksum(right, left);
    let left_index = left.paths_by_checksum();
    let right_index = right.paths_by_checksum();

    let checksums: BTreeSet<&Checksum> = left_only.keys().chain(right_only.keys()).copied().collect();
    for checksum in checksums {
        let lefts = left_only.get(checksum).map(Vec::as_slice).unwrap_or_default();
        let rights = right_only.get(checksum).map(Vec::as_slice).unwrap_or_default();

        match (lefts, rights) {
            ([l], [r]) if l.size == r.size => {
                let rename_on = options.move_policy.rename_on(&l.path, &r.path);
                decisions.push(SyncDecision::Move {
                    checksum: checksum.clone(),
                    left_path: l.path.clone(),
                    right_path: r.path.clone(),
                    rename_on,
                });
            }
            // Equal digests with unequal sizes point at a damaged record, so
            // they are never proposed as a plain rename.
            ([_, ..], [_, ..]) => {
                if lefts.iter().chain(rights).any(|r| r.size != lefts[0].size) {
                    warn!(checksum = %checksum, "same checksum with different sizes; left for review");
                } else {
                    debug!(checksum = %checksum, left = lefts.len(), right = rights.len(), "ambiguous move");
                }
                decisions.push(SyncDecision::AmbiguousMove {
                    checksum: checksum.clone(),
                    left_paths: lefts.iter().map(|r| r.path.clone()).collect(),
                    right_paths: rights.iter().map(|r| r.path.clone()).collect(),
                });
            }
            (missing_on_right, []) => {
                place_missing(missing_on_right, Side::Right, right_index.get(checksum), &mut decisions);
            }
            ([], missing_on_left) => {
                place_missing(missing_on_left, Side::Left, left_index.get(checksum), &mut decisions);
            }
        }
    }

    decisions.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
    log_summary(&decisions);
    decisions
}

fn compare_shared(left: &InventoryRecord, right: &InventoryRecord) -> SyncDecision {
    if !left.same_content(right) {
        debug!(path = %left.path, "same path, different content");
        return SyncDecision::Conflict {
            path: left.path.clone(),
            left: left.clone(),
            right: right.clone(),
        };
    }
    if !left.same_metadata(right) {
        return SyncDecision::MetadataOnlyDifference {
            path: left.path.clone(),
            left: left.clone(),
            right: right.clone(),
        };
    }
    SyncDecision::Unchanged {
        path: left.path.clone(),
        checksum: left.checksum.clone(),
    }
}

/// Records of `this` whose path `other` lacks, grouped by checksum.
fn unshared_by_checksum<'a>(
    this: &'a MergedInventory,
    other: &MergedInventory,
) -> BTreeMap<&'a Checksum, Vec<&'a InventoryRecord>> {
    let mut index: BTreeMap<&Checksum, Vec<&InventoryRecord>> = BTreeMap::new();
    for record in this.records().filter(|r| !other.contains(&r.path)) {
        index.entry(&record.checksum).or_default().push(record);
    }
    index
}

/// Decide for records absent from `missing_on`. `holders` lists where that
/// side already has the content; with no unmatched path left there, those
/// are all shared paths.
fn place_missing(
    records: &[&InventoryRecord],
    missing_on: Side,
    holders: Option<&Vec<&str>>,
    decisions: &mut Vec<SyncDecision>,
) {
    let source = holders.and_then(|paths| paths.iter().min().copied());
    for record in records {
        let decision = match source {
            Some(from) => SyncDecision::LocalCopy {
                side: missing_on,
                from: from.to_string(),
                to: record.path.clone(),
                checksum: record.checksum.clone(),
                size: record.size,
            },
            None => match missing_on {
                Side::Right => SyncDecision::CopyLeftToRight {
                    record: (*record).clone(),
                },
                Side::Left => SyncDecision::CopyRightToLeft {
                    record: (*record).clone(),
                },
            },
        };
        decisions.push(decision);
    }
}

fn log_summary(decisions: &[SyncDecision]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for decision in decisions {
        *counts.entry(decision.kind_label()).or_default() += 1;
    }
    info!(decisions = decisions.len(), ?counts, "diff finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MovePolicy::PreferredPath, "a.jpg", "dir/a.jpg", Side::Right)]
    #[case(MovePolicy::PreferredPath, "dir/a.jpg", "a.jpg", Side::Left)]
    #[case(MovePolicy::PreferredPath, "b.jpg", "a.jpg", Side::Left)]
    #[case(MovePolicy::Canonical(Side::Left), "a.jpg", "dir/a.jpg", Side::Right)]
    #[case(MovePolicy::Canonical(Side::Right), "a.jpg", "dir/a.jpg", Side::Left)]
    fn rename_side(#[case] policy: MovePolicy, #[case] left: &str, #[case] right: &str, #[case] expected: Side) {
        assert_eq!(policy.rename_on(left, right), expected);
    }

    #[test]
    fn policy_names_round_trip() {
        for policy in [
            MovePolicy::PreferredPath,
            MovePolicy::Canonical(Side::Left),
            MovePolicy::Canonical(Side::Right),
        ] {
            assert_eq!(policy.as_str().parse::<MovePolicy>().unwrap(), policy);
        }
        assert!("left".parse::<MovePolicy>().is_err());
    }
}
