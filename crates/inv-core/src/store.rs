//! Inventory persistence
//!
//! Reading and writing inventory documents, and loading every inventory of
//! a tree. A broken inventory only takes its own directory out of a tree
//! load; the rest is still merged.

use std::fs;

use chrono::{DateTime, Utc};
use inv_fs::{DocumentStore, InventoryFile, NormalizedPath, list_directories};
use tracing::{debug, info, warn};

use crate::merge::{DirectoryFailure, MergeOutcome, merge_with_listing};
use crate::model::{
    DirectoryInventory, InventoryFormat, MergedInventory, RawDirectoryInventory, RawEntries, RawMergedInventory,
};
use crate::validate::{ValidationOptions, validate, validate_merged};
use crate::{Error, Result};

/// Load and validate one per-directory inventory file. Both the keyed and
/// the legacy list form are accepted.
pub fn load_directory_inventory(
    path: &NormalizedPath,
    directory: &str,
    options: ValidationOptions,
) -> Result<DirectoryInventory> {
    let entries: RawEntries = DocumentStore::new().load(path)?;
    validate(RawDirectoryInventory::new(directory, entries), options)
}

/// Write an inventory in keyed form, atomically.
pub fn save_directory_inventory(inventory: &DirectoryInventory, path: &NormalizedPath) -> Result<()> {
    DocumentStore::new().save(path, inventory)?;
    debug!(path = %path, records = inventory.len(), "saved inventory");
    Ok(())
}

/// Load and validate a merged inventory document.
///
/// A bare list of `[path, size, checksum]` entries is also accepted. Such a
/// file carries no header, so its tree root is the directory holding it and
/// its generation time is the file's modification time.
pub fn load_merged(path: &NormalizedPath, options: ValidationOptions) -> Result<MergedInventory> {
    let store = DocumentStore::new();
    let raw = match store.load::<RawMergedInventory>(path) {
        Ok(raw) => raw,
        Err(err) => match store.load::<RawEntries>(path) {
            Ok(entries) if entries.format == InventoryFormat::Legacy => {
                info!(path = %path, records = entries.records.len(), "reading merged inventory in list form");
                RawMergedInventory::from_entries(list_form_root(path), modified_at(path), entries)
            }
            _ => return Err(err.into()),
        },
    };
    validate_merged(raw, options)
}

fn list_form_root(path: &NormalizedPath) -> String {
    path.parent().map(|p| p.as_str().to_string()).unwrap_or_default()
}

fn modified_at(path: &NormalizedPath) -> DateTime<Utc> {
    fs::metadata(path.to_native())
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

pub fn save_merged(inventory: &MergedInventory, path: &NormalizedPath) -> Result<()> {
    DocumentStore::new().save(path, inventory)?;
    info!(path = %path, records = inventory.len(), "saved merged inventory");
    Ok(())
}

/// Everything found while loading a tree's inventories.
#[derive(Debug, Clone, Default)]
pub struct TreeLoad {
    /// Directories holding files or an inventory
    pub populated: Vec<String>,
    /// Sorted by directory
    pub inventories: Vec<DirectoryInventory>,
    /// Sorted by directory
    pub failures: Vec<DirectoryFailure>,
}

/// Load every inventory file under `root`.
///
/// # Errors
///
/// Only if `root` cannot be walked. Unreadable or malformed inventories are
/// collected in [`TreeLoad::failures`].
pub fn load_tree(root: &NormalizedPath, file_name: &str, options: ValidationOptions) -> Result<TreeLoad> {
    let mut load = TreeLoad::default();

    for directory in list_directories(root)? {
        let dir_path = root.join(&directory);
        let inventory_path = dir_path.join(file_name);

        let has_inventory = inventory_path.is_file();
        if has_inventory || has_files(&dir_path, file_name) {
            load.populated.push(directory.clone());
        }
        if !has_inventory {
            continue;
        }

        match load_directory_inventory(&inventory_path, &directory, options) {
            Ok(inventory) => {
                debug!(directory = %directory, records = inventory.len(), "loaded inventory");
                load.inventories.push(inventory);
            }
            Err(err) => {
                warn!(directory = %directory, error = %err, "skipping unusable inventory");
                load.failures.push(DirectoryFailure {
                    message: failure_message(&err),
                    directory,
                });
            }
        }
    }

    info!(
        root = %root,
        inventories = load.inventories.len(),
        failures = load.failures.len(),
        "loaded tree"
    );
    Ok(load)
}

/// Load a tree and merge it, checking coverage against the directories
/// that hold files.
pub fn build_merged(root: &NormalizedPath, file_name: &str, options: ValidationOptions) -> Result<MergeOutcome> {
    let load = load_tree(root, file_name, options)?;
    let outcome = merge_with_listing(root.as_str(), &load.inventories, &load.populated);
    Ok(outcome.with_failures(load.failures))
}

/// Error text including every validation issue.
fn failure_message(err: &Error) -> String {
    let issues = err.issues();
    if issues.is_empty() {
        return err.to_string();
    }
    let details: Vec<String> = issues.iter().map(ToString::to_string).collect();
    format!("{}: {}", err, details.join("; "))
}

/// True when the directory holds a visible regular file other than the
/// inventory itself or the tool's own merged and settings files.
fn has_files(dir: &NormalizedPath, inventory_name: &str) -> bool {
    let Ok(entries) = fs::read_dir(dir.to_native()) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        !name.starts_with('.')
            && name != inventory_name
            && name != InventoryFile::Merged.as_str()
            && name != InventoryFile::Settings.as_str()
            && entry.path().is_file()
    })
}
