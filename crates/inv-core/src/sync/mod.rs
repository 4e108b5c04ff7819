//! Sync differ and reconciliation planning
//!
//! - [`diff`] / [`diff_with`]: classify every path across two snapshots
//! - [`Plan`]: turn decisions into operations for one sync direction
//! - [`render_script`]: shell text for an external executor

mod decision;
mod diff;
mod plan;
mod render;

pub use decision::{Operation, SyncDecision};
pub use diff::{DiffOptions, MovePolicy, diff, diff_with};
pub use plan::{Plan, PlanOptions, PlanSummary, PlannedOperation, SyncDirection, Tally};
pub use render::{RenderedScript, is_safe_name, render_removals, render_script};
