//! Inventory data model
//!
//! - [`InventoryRecord`]: tracked identity of one file
//! - [`DirectoryInventory`]: records of one directory
//! - [`MergedInventory`]: records of a whole tree, root-relative
//! - raw wire forms, read before validation

mod checksum;
mod directory;
mod merged;
pub mod raw;
mod record;
pub mod timestamp;

pub use checksum::{Checksum, InvalidChecksum};
pub use directory::DirectoryInventory;
pub use merged::{MERGED_FORMAT, MergedInventory};
pub use raw::{InventoryFormat, RawDirectoryInventory, RawEntries, RawMergedInventory, RawRecord};
pub use record::{Dimensions, InventoryRecord};

use serde::Serialize;

/// One of the two snapshots in a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
