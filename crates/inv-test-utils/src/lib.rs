//! Shared test fixtures for the inventory-manager workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`records`]: record, inventory and snapshot builders
//! - [`tree`]: [`TestTree`] temporary photo trees on disk

pub mod records;
pub mod tree;

pub use records::{directory, fixed_time, record, snapshot, snapshot_at};
pub use tree::TestTree;
