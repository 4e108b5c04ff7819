//! Builders for in-memory inventories.
//!
//! Records are derived from their content bytes, so two records built from
//! the same bytes share size and checksum, as real files would.

use chrono::{DateTime, TimeZone, Utc};
use inv_core::{Checksum, DirectoryInventory, InventoryRecord, MergedInventory};

/// Timestamp used for every generated snapshot.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// A record whose size and checksum describe `content`.
pub fn record(path: &str, content: &[u8]) -> InventoryRecord {
    InventoryRecord::new(path, content.len() as u64, Checksum::of_bytes(content))
}

/// A per-directory inventory with one record per `(name, content)` pair.
pub fn directory(dir: &str, files: &[(&str, &[u8])]) -> DirectoryInventory {
    let mut inventory = DirectoryInventory::new(dir);
    for (name, content) in files {
        inventory.insert(record(name, content));
    }
    inventory
}

/// A merged snapshot of root-relative `(path, content)` pairs.
///
/// # Panics
/// Panics if a path repeats.
pub fn snapshot(files: &[(&str, &[u8])]) -> MergedInventory {
    snapshot_at("tree", files)
}

/// Like [`snapshot`], for a tree rooted at `tree_root`.
///
/// # Panics
/// Panics if a path repeats.
pub fn snapshot_at(tree_root: &str, files: &[(&str, &[u8])]) -> MergedInventory {
    MergedInventory::from_records(tree_root, fixed_time(), files.iter().map(|(p, c)| record(p, c)))
        .unwrap_or_else(|e| panic!("snapshot fixture: {e}"))
}
