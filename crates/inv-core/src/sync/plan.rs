//! Reconciliation plans
//!
//! A plan turns diff decisions into an ordered operation list for one sync
//! direction. Decisions that need review are carried along untouched and
//! never produce operations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Operation, SyncDecision};
use crate::model::Side;
use crate::{Error, Result};

/// What the plan tries to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncDirection {
    /// Copy to whichever side is missing a file
    #[default]
    BothWays,
    /// Make the right side look like the left
    LeftToRight,
    /// Make the left side look like the right
    RightToLeft,
}

impl SyncDirection {
    /// Side being brought in line, if only one is.
    pub fn target(self) -> Option<Side> {
        match self {
            Self::BothWays => None,
            Self::LeftToRight => Some(Side::Right),
            Self::RightToLeft => Some(Side::Left),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BothWays => "both",
            Self::LeftToRight => "left-to-right",
            Self::RightToLeft => "right-to-left",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "both" | "both-ways" => Ok(Self::BothWays),
            "left-to-right" => Ok(Self::LeftToRight),
            "right-to-left" => Ok(Self::RightToLeft),
            other => Err(Error::InvalidPlanOptions {
                message: format!("unknown direction '{other}'"),
            }),
        }
    }
}

/// Options for [`Plan::build`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    pub direction: SyncDirection,
    /// Keep only copies (cross-side and local)
    pub only_copy: bool,
    /// Keep only deletions; needs a one-way direction
    pub only_delete: bool,
}

impl PlanOptions {
    pub fn validate(&self) -> Result<()> {
        if self.only_copy && self.only_delete {
            return Err(Error::InvalidPlanOptions {
                message: "only-copy and only-delete exclude each other".into(),
            });
        }
        if self.only_delete && self.direction == SyncDirection::BothWays {
            return Err(Error::InvalidPlanOptions {
                message: "only-delete needs a one-way direction".into(),
            });
        }
        Ok(())
    }
}

/// One operation with the byte count it moves or frees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedOperation {
    #[serde(flatten)]
    pub operation: Operation,
    pub size: u64,
}

/// File count and byte total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub files: usize,
    pub bytes: u64,
}

impl Tally {
    fn add(&mut self, size: u64) {
        self.files += 1;
        self.bytes += size;
    }
}

/// Per-side totals. Each tally is keyed by the side that changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub copies_to_left: Tally,
    pub copies_to_right: Tally,
    pub deletes_on_left: Tally,
    pub deletes_on_right: Tally,
    pub renames_on_left: usize,
    pub renames_on_right: usize,
    pub local_copies_on_left: Tally,
    pub local_copies_on_right: Tally,
    pub needs_review: usize,
}

impl PlanSummary {
    fn record(&mut self, planned: &PlannedOperation) {
        let size = planned.size;
        match &planned.operation {
            Operation::Copy { from: Side::Left, .. } => self.copies_to_right.add(size),
            Operation::Copy { from: Side::Right, .. } => self.copies_to_left.add(size),
            Operation::Delete { side: Side::Left, .. } => self.deletes_on_left.add(size),
            Operation::Delete { side: Side::Right, .. } => self.deletes_on_right.add(size),
            Operation::Rename { side: Side::Left, .. } => self.renames_on_left += 1,
            Operation::Rename { side: Side::Right, .. } => self.renames_on_right += 1,
            Operation::LocalCopy { side: Side::Left, .. } => self.local_copies_on_left.add(size),
            Operation::LocalCopy { side: Side::Right, .. } => self.local_copies_on_right.add(size),
        }
    }
}

/// Ordered, reviewable operation list. Data only; nothing is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub direction: SyncDirection,
    pub operations: Vec<PlannedOperation>,
    /// Conflicts and ambiguous moves
    pub review: Vec<SyncDecision>,
    pub summary: PlanSummary,
}

impl Plan {
    /// Build a plan from diff decisions.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPlanOptions`] for contradictory filters.
    pub fn build(decisions: &[SyncDecision], options: &PlanOptions) -> Result<Self> {
        options.validate()?;

        let mut operations = Vec::new();
        let mut review = Vec::new();
        for decision in decisions {
            if decision.needs_review() {
                review.push(decision.clone());
                continue;
            }
            if let Some(planned) = plan_decision(decision, options.direction)
                && keep(&planned.operation, options)
            {
                operations.push(planned);
            }
        }

        let mut summary = PlanSummary {
            needs_review: review.len(),
            ..PlanSummary::default()
        };
        for planned in &operations {
            summary.record(planned);
        }
        log_summary(&summary);

        Ok(Self {
            direction: options.direction,
            operations,
            review,
            summary,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.review.is_empty()
    }
}

fn plan_decision(decision: &SyncDecision, direction: SyncDirection) -> Option<PlannedOperation> {
    let target = direction.target();
    match decision {
        SyncDecision::CopyLeftToRight { record } => Some(fill_or_remove(
            Side::Right,
            target,
            Operation::Copy {
                from: Side::Left,
                path: record.path.clone(),
            },
            &record.path,
            record.size,
        )),
        SyncDecision::CopyRightToLeft { record } => Some(fill_or_remove(
            Side::Left,
            target,
            Operation::Copy {
                from: Side::Right,
                path: record.path.clone(),
            },
            &record.path,
            record.size,
        )),
        SyncDecision::LocalCopy {
            side, from, to, size, ..
        } => Some(fill_or_remove(
            *side,
            target,
            Operation::LocalCopy {
                side: *side,
                from: from.clone(),
                to: to.clone(),
            },
            to,
            *size,
        )),
        SyncDecision::Move {
            left_path,
            right_path,
            rename_on,
            ..
        } => {
            let side = target.unwrap_or(*rename_on);
            let (from, to) = match side {
                Side::Left => (left_path, right_path),
                Side::Right => (right_path, left_path),
            };
            Some(PlannedOperation {
                operation: Operation::Rename {
                    side,
                    from: from.clone(),
                    to: to.clone(),
                },
                size: 0,
            })
        }
        SyncDecision::Unchanged { .. }
        | SyncDecision::MetadataOnlyDifference { .. }
        | SyncDecision::Conflict { .. }
        | SyncDecision::AmbiguousMove { .. } => None,
    }
}

/// `path` is missing on `missing_on`. Fill it there, unless the plan
/// brings the other side in line, in which case the surplus copy goes.
fn fill_or_remove(
    missing_on: Side,
    target: Option<Side>,
    fill: Operation,
    path: &str,
    size: u64,
) -> PlannedOperation {
    let operation = match target {
        Some(target) if target != missing_on => Operation::Delete {
            side: target,
            path: path.to_string(),
        },
        _ => fill,
    };
    PlannedOperation { operation, size }
}

fn keep(operation: &Operation, options: &PlanOptions) -> bool {
    let is_copy = matches!(operation, Operation::Copy { .. } | Operation::LocalCopy { .. });
    let is_delete = matches!(operation, Operation::Delete { .. });
    if options.only_copy {
        return is_copy;
    }
    if options.only_delete {
        return is_delete;
    }
    true
}

fn log_summary(summary: &PlanSummary) {
    let lines = [
        ("cp", "from left to right", summary.copies_to_right),
        ("cp", "from right to left", summary.copies_to_left),
        ("cp", "within left", summary.local_copies_on_left),
        ("cp", "within right", summary.local_copies_on_right),
        ("rm", "from left", summary.deletes_on_left),
        ("rm", "from right", summary.deletes_on_right),
    ];
    for (verb, place, tally) in lines {
        info!("Would {} {} files worth {} bytes {}", verb, tally.files, tally.bytes, place);
    }
    info!(
        renames_on_left = summary.renames_on_left,
        renames_on_right = summary.renames_on_right,
        needs_review = summary.needs_review,
        "plan built"
    );
}
