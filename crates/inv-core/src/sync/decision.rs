//! Reconciliation decisions and proposed operations

use serde::Serialize;

use crate::model::{Checksum, InventoryRecord, Side};

/// A concrete change proposed by a decision. Never executed by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Copy `path` from side `from` to the same path on the other side
    Copy { from: Side, path: String },
    Delete { side: Side, path: String },
    Rename { side: Side, from: String, to: String },
    /// Duplicate content already present on `side`
    LocalCopy { side: Side, from: String, to: String },
}

impl Operation {
    /// Side whose files change.
    pub fn target_side(&self) -> Side {
        match self {
            Self::Copy { from, .. } => from.other(),
            Self::Delete { side, .. } | Self::Rename { side, .. } | Self::LocalCopy { side, .. } => *side,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Copy { .. } => "copy",
            Self::Delete { .. } => "delete",
            Self::Rename { .. } => "rename",
            Self::LocalCopy { .. } => "local-copy",
        }
    }
}

/// Classification of one path, or of the paths tied together by one
/// checksum, across two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncDecision {
    /// Same path, same content, same metadata
    Unchanged { path: String, checksum: Checksum },
    /// Same path, different content. Never resolved automatically.
    Conflict {
        path: String,
        left: InventoryRecord,
        right: InventoryRecord,
    },
    /// Same content under one path on each side
    Move {
        checksum: Checksum,
        left_path: String,
        right_path: String,
        /// Side whose path gets renamed to the other side's path
        rename_on: Side,
    },
    /// Same content under several unmatched paths; listed, never guessed
    AmbiguousMove {
        checksum: Checksum,
        left_paths: Vec<String>,
        right_paths: Vec<String>,
    },
    /// Content exists only on the left
    CopyLeftToRight { record: InventoryRecord },
    /// Content exists only on the right
    CopyRightToLeft { record: InventoryRecord },
    /// Same path and content, differing capture date or dimensions
    MetadataOnlyDifference {
        path: String,
        left: InventoryRecord,
        right: InventoryRecord,
    },
    /// Path missing on `side`, whose content `side` already holds at `from`
    LocalCopy {
        side: Side,
        from: String,
        to: String,
        checksum: Checksum,
        size: u64,
    },
}

impl SyncDecision {
    /// Every path this decision covers, sorted and deduplicated.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = match self {
            Self::Unchanged { path, .. }
            | Self::Conflict { path, .. }
            | Self::MetadataOnlyDifference { path, .. } => vec![path.as_str()],
            Self::Move {
                left_path,
                right_path,
                ..
            } => vec![left_path.as_str(), right_path.as_str()],
            Self::AmbiguousMove {
                left_paths,
                right_paths,
                ..
            } => left_paths
                .iter()
                .chain(right_paths.iter())
                .map(String::as_str)
                .collect(),
            Self::CopyLeftToRight { record } | Self::CopyRightToLeft { record } => {
                vec![record.path.as_str()]
            }
            Self::LocalCopy { to, .. } => vec![to.as_str()],
        };
        paths.sort_unstable();
        paths.dedup();
        paths
    }

    /// Smallest covered path; decisions are ordered by it.
    pub fn sort_key(&self) -> &str {
        self.paths().first().copied().unwrap_or_default()
    }

    pub fn checksum(&self) -> Option<&Checksum> {
        match self {
            Self::Unchanged { checksum, .. }
            | Self::Move { checksum, .. }
            | Self::AmbiguousMove { checksum, .. }
            | Self::LocalCopy { checksum, .. } => Some(checksum),
            Self::CopyLeftToRight { record } | Self::CopyRightToLeft { record } => Some(&record.checksum),
            Self::MetadataOnlyDifference { left, .. } => Some(&left.checksum),
            Self::Conflict { .. } => None,
        }
    }

    /// Proposes at least one operation.
    pub fn is_actionable(&self) -> bool {
        !self.proposals().is_empty()
    }

    /// Needs a person to look at it before anything can happen.
    pub fn needs_review(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::AmbiguousMove { .. })
    }

    /// Operations suggested when both sides should end up complete.
    pub fn proposals(&self) -> Vec<Operation> {
        match self {
            Self::Move {
                left_path,
                right_path,
                rename_on,
                ..
            } => {
                let (from, to) = match rename_on {
                    Side::Left => (left_path, right_path),
                    Side::Right => (right_path, left_path),
                };
                vec![Operation::Rename {
                    side: *rename_on,
                    from: from.clone(),
                    to: to.clone(),
                }]
            }
            Self::CopyLeftToRight { record } => vec![Operation::Copy {
                from: Side::Left,
                path: record.path.clone(),
            }],
            Self::CopyRightToLeft { record } => vec![Operation::Copy {
                from: Side::Right,
                path: record.path.clone(),
            }],
            Self::LocalCopy { side, from, to, .. } => vec![Operation::LocalCopy {
                side: *side,
                from: from.clone(),
                to: to.clone(),
            }],
            Self::Unchanged { .. }
            | Self::Conflict { .. }
            | Self::AmbiguousMove { .. }
            | Self::MetadataOnlyDifference { .. } => Vec::new(),
        }
    }

    /// The same decision as seen from a diff with the sides swapped.
    pub fn mirrored(&self) -> Self {
        match self.clone() {
            Self::Unchanged { path, checksum } => Self::Unchanged { path, checksum },
            Self::Conflict { path, left, right } => Self::Conflict {
                path,
                left: right,
                right: left,
            },
            Self::Move {
                checksum,
                left_path,
                right_path,
                rename_on,
            } => Self::Move {
                checksum,
                left_path: right_path,
                right_path: left_path,
                rename_on: rename_on.other(),
            },
            Self::AmbiguousMove {
                checksum,
                left_paths,
                right_paths,
            } => Self::AmbiguousMove {
                checksum,
                left_paths: right_paths,
                right_paths: left_paths,
            },
            Self::CopyLeftToRight { record } => Self::CopyRightToLeft { record },
            Self::CopyRightToLeft { record } => Self::CopyLeftToRight { record },
            Self::MetadataOnlyDifference { path, left, right } => Self::MetadataOnlyDifference {
                path,
                left: right,
                right: left,
            },
            Self::LocalCopy {
                side,
                from,
                to,
                checksum,
                size,
            } => Self::LocalCopy {
                side: side.other(),
                from,
                to,
                checksum,
                size,
            },
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Unchanged { .. } => "unchanged",
            Self::Conflict { .. } => "conflict",
            Self::Move { .. } => "move",
            Self::AmbiguousMove { .. } => "ambiguous-move",
            Self::CopyLeftToRight { .. } => "copy-left-to-right",
            Self::CopyRightToLeft { .. } => "copy-right-to-left",
            Self::MetadataOnlyDifference { .. } => "metadata-only",
            Self::LocalCopy { .. } => "local-copy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> InventoryRecord {
        InventoryRecord::new(path, 3, Checksum::of_bytes(b"abc"))
    }

    #[test]
    fn move_proposes_rename_on_named_side() {
        let decision = SyncDecision::Move {
            checksum: Checksum::of_bytes(b"abc"),
            left_path: "a.jpg".into(),
            right_path: "b/a.jpg".into(),
            rename_on: Side::Right,
        };
        assert_eq!(
            decision.proposals(),
            vec![Operation::Rename {
                side: Side::Right,
                from: "b/a.jpg".into(),
                to: "a.jpg".into(),
            }]
        );
        assert_eq!(decision.paths(), vec!["a.jpg", "b/a.jpg"]);
        assert!(decision.is_actionable());
        assert!(!decision.needs_review());
    }

    #[test]
    fn mirroring_twice_is_identity() {
        let decisions = vec![
            SyncDecision::CopyLeftToRight { record: record("x.jpg") },
            SyncDecision::Conflict {
                path: "c.jpg".into(),
                left: record("c.jpg"),
                right: InventoryRecord::new("c.jpg", 1, Checksum::of_bytes(b"z")),
            },
            SyncDecision::LocalCopy {
                side: Side::Left,
                from: "a.jpg".into(),
                to: "b.jpg".into(),
                checksum: Checksum::of_bytes(b"abc"),
                size: 3,
            },
        ];
        for d in decisions {
            assert_ne!(d.mirrored(), d);
            assert_eq!(d.mirrored().mirrored(), d);
        }
    }

    #[test]
    fn review_decisions_propose_nothing() {
        let ambiguous = SyncDecision::AmbiguousMove {
            checksum: Checksum::of_bytes(b"abc"),
            left_paths: vec!["a.jpg".into(), "b.jpg".into()],
            right_paths: vec!["c.jpg".into()],
        };
        assert!(ambiguous.needs_review());
        assert!(!ambiguous.is_actionable());
        assert_eq!(ambiguous.sort_key(), "a.jpg");
    }

    #[test]
    fn copy_operation_targets_other_side() {
        let op = Operation::Copy {
            from: Side::Left,
            path: "a.jpg".into(),
        };
        assert_eq!(op.target_side(), Side::Right);
        assert_eq!(op.kind_label(), "copy");
    }
}
