//! Command implementations for inv-cli

pub mod dedupe;
pub mod diff;
pub mod merge;
pub mod scan;
pub mod verify;

pub use dedupe::{DedupeArgs, run_dedupe};
pub use diff::{DiffArgs, run_diff};
pub use merge::run_merge;
pub use scan::{ScanArgs, run_scan};
pub use verify::run_verify;

use std::path::Path;

use colored::Colorize;
use inv_core::store::{build_merged, load_merged};
use inv_core::{MergedInventory, Settings};
use inv_fs::NormalizedPath;
use serde::Serialize;

use crate::error::{CliError, Result};

/// Load a snapshot from a merged inventory file, or merge a tree on the fly.
///
/// Merging on the fly reports problems on stderr but never writes anything.
pub(crate) fn load_snapshot(path: &Path, settings: &Settings) -> Result<MergedInventory> {
    let normalized = NormalizedPath::new(path);
    if normalized.is_file() {
        return Ok(load_merged(&normalized, settings.validation_options())?);
    }
    if !normalized.is_dir() {
        return Err(CliError::user(format!("'{}' is neither a file nor a directory", path.display())));
    }

    let outcome = build_merged(&normalized, &settings.inventory_file_name, settings.validation_options())?;
    for conflict in &outcome.conflicts {
        eprintln!("{} path '{}' claimed by several inventories", "warning:".yellow(), conflict.path);
    }
    for failure in &outcome.failures {
        eprintln!("{} skipped '{}': {}", "warning:".yellow(), failure.directory, failure.message);
    }
    Ok(outcome.inventory)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Byte count with a binary unit.
pub(crate) fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Directory name for display; the tree root itself has an empty name.
pub(crate) fn display_dir(directory: &str) -> &str {
    if directory.is_empty() { "." } else { directory }
}
