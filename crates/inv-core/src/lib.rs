//! Inventory reconciliation engine
//!
//! This crate holds everything between a crawled directory listing and a
//! reviewable action plan:
//!
//! - **Record store**: typed inventory records, validation of stored documents
//! - **Merge engine**: per-directory inventories into one tree snapshot, with
//!   conflict and coverage reporting
//! - **Dedupe analyzer**: checksum groups, survivor selection, removal lists
//! - **Sync differ**: classification of every path across two snapshots and
//!   the plans and shell scripts derived from it
//! - **Verification**: stored inventory against a fresh crawl
//!
//! # Architecture
//!
//! ```text
//!                  inv-cli
//!                     |
//!                  inv-core
//!                     |
//!                   inv-fs
//! ```
//!
//! Nothing here touches image files beyond reading and writing inventory
//! documents. Divergent data is reported as values; [`Error`] is reserved
//! for unusable input.
//!
//! # Example
//!
//! ```ignore
//! use inv_core::{diff, store, validate::ValidationOptions};
//! use inv_fs::NormalizedPath;
//!
//! let left = store::load_merged(&NormalizedPath::new("a/merged-inventory.json"), ValidationOptions::default())?;
//! let right = store::load_merged(&NormalizedPath::new("b/merged-inventory.json"), ValidationOptions::default())?;
//! for decision in diff(&left, &right) {
//!     println!("{}: {:?}", decision.kind_label(), decision.paths());
//! }
//! ```

pub mod dedupe;
pub mod error;
pub mod merge;
pub mod model;
pub mod settings;
pub mod store;
pub mod sync;
pub mod validate;
pub mod verify;

pub use dedupe::{DedupeGroup, DedupeReport, RemovalSuggestion, SurvivorPolicy, SurvivorPolicyKind, find_duplicates};
pub use error::{Error, Result};
pub use merge::{CoverageWarning, DirectoryFailure, MergeConflict, MergeOutcome, merge, merge_with_listing};
pub use model::{Checksum, DirectoryInventory, InventoryFormat, InventoryRecord, MergedInventory, Side};
pub use settings::{Settings, SettingsResolver};
pub use sync::{MovePolicy, Operation, Plan, PlanOptions, SyncDecision, SyncDirection, diff, diff_with};
pub use validate::{IssueKind, ValidationIssue, ValidationOptions};
pub use verify::{ApprovalRules, InventoryChange, VerifyReport, VerifyStatus, compare_inventories};
