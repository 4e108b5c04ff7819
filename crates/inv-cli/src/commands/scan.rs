//! Scan command implementation

use std::path::{Path, PathBuf};

use chrono::Utc;
use colored::Colorize;
use inv_core::model::RawDirectoryInventory;
use inv_core::store::{load_directory_inventory, save_directory_inventory};
use inv_core::validate::validate;
use inv_core::{InventoryChange, InventoryFormat, Settings, ValidationOptions, VerifyStatus, compare_inventories};
use inv_fs::{NormalizedPath, ScanOptions, list_directories, scan_directory};
use serde::Serialize;

use super::{human_bytes, print_json};
use crate::error::{CliError, Result};

/// Flags of `inv scan`.
#[derive(Debug, Clone, Default)]
pub struct ScanArgs {
    pub recursive: bool,
    pub all_files: bool,
    pub replace: bool,
    pub workers: Option<usize>,
    pub json: bool,
}

/// What happened to one directory's inventory file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    /// No inventory existed; one was written
    Created,
    /// Stored inventory matched the files
    Unchanged,
    /// Only accepted changes; rewritten
    Updated,
    /// Differences overwritten because of `--replace`
    Replaced,
    /// Differences found; stored inventory left alone
    Kept,
    /// Some files could not be read; nothing written
    Incomplete,
    /// Nothing to inventory
    Skipped,
}

impl ScanAction {
    fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Unchanged => "unchanged",
            Self::Updated => "updated",
            Self::Replaced => "replaced",
            Self::Kept => "differs",
            Self::Incomplete => "incomplete",
            Self::Skipped => "skipped",
        }
    }

    fn paint(self, text: String) -> colored::ColoredString {
        match self {
            Self::Created | Self::Updated => text.green(),
            Self::Unchanged | Self::Skipped => text.dimmed(),
            Self::Replaced => text.yellow(),
            Self::Kept | Self::Incomplete => text.red(),
        }
    }

    fn is_unresolved(self) -> bool {
        matches!(self, Self::Kept | Self::Incomplete)
    }
}

/// Per-directory result, also the `--json` shape.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryScan {
    pub directory: String,
    pub action: ScanAction,
    pub files: usize,
    pub bytes: u64,
    /// Files that could not be read, with the reason
    pub failures: Vec<String>,
    pub changes: Vec<InventoryChange>,
}

/// Run the scan command
pub fn run_scan(settings: &Settings, dirs: &[PathBuf], args: &ScanArgs) -> Result<()> {
    let mut options = settings.scan_options();
    options.include_all_files |= args.all_files;
    if let Some(workers) = args.workers {
        options.workers = workers;
    }

    let mut results = Vec::new();
    for dir in dirs {
        results.extend(scan_tree(settings, dir, &options, args)?);
    }

    if args.json {
        print_json(&results)?;
    } else {
        print_results(&results);
    }

    let unresolved = results.iter().filter(|r| r.action.is_unresolved()).count();
    if unresolved > 0 {
        return Err(CliError::user(format!(
            "{unresolved} director{} not written; review the differences or rerun with --replace",
            if unresolved == 1 { "y was" } else { "ies were" }
        )));
    }
    Ok(())
}

fn scan_tree(settings: &Settings, dir: &Path, options: &ScanOptions, args: &ScanArgs) -> Result<Vec<DirectoryScan>> {
    let root = NormalizedPath::new(dir);
    if !root.is_dir() {
        return Err(CliError::user(format!("'{}' is not a directory", dir.display())));
    }

    let directories = if args.recursive {
        list_directories(&root)?
    } else {
        vec![String::new()]
    };

    directories
        .iter()
        .map(|relative| scan_one(settings, &root, relative, options, args.replace))
        .collect()
}

fn scan_one(
    settings: &Settings,
    root: &NormalizedPath,
    relative: &str,
    options: &ScanOptions,
    replace: bool,
) -> Result<DirectoryScan> {
    let target = root.join(relative);
    let inventory_path = target.join(&settings.inventory_file_name);
    let outcome = scan_directory(&target, options)?;

    // Fresh scans never carry capture dates or dimensions, so completeness
    // is only enforced on what was stored.
    let raw = RawDirectoryInventory::from_scan(relative, &outcome, Utc::now());
    let mut fresh = validate(raw, ValidationOptions::default())?;

    let mut result = DirectoryScan {
        directory: target.as_str().to_string(),
        action: ScanAction::Created,
        files: fresh.len(),
        bytes: fresh.total_bytes(),
        failures: outcome
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.name, f.message))
            .collect(),
        changes: Vec::new(),
    };

    let stored = if inventory_path.is_file() {
        Some(load_directory_inventory(
            &inventory_path,
            relative,
            settings.validation_options(),
        )?)
    } else {
        None
    };

    let action = match &stored {
        None if fresh.is_empty() && outcome.filter_summary.passed.is_empty() && outcome.filter_summary.rejected.is_empty() => {
            ScanAction::Skipped
        }
        _ if !outcome.is_complete() && !replace => ScanAction::Incomplete,
        None => ScanAction::Created,
        Some(old) => {
            fresh.carry_metadata_from(old);
            let report = compare_inventories(old, &fresh, &settings.approval_rules());
            result.changes = report.changes;
            match report.status {
                VerifyStatus::Matched if old.format() == InventoryFormat::Legacy => ScanAction::Updated,
                VerifyStatus::Matched => ScanAction::Unchanged,
                VerifyStatus::Accepted => ScanAction::Updated,
                VerifyStatus::Differences if replace => ScanAction::Replaced,
                VerifyStatus::Differences => ScanAction::Kept,
            }
        }
    };
    result.action = action;

    if matches!(
        result.action,
        ScanAction::Created | ScanAction::Updated | ScanAction::Replaced
    ) {
        save_directory_inventory(&fresh, &inventory_path)?;
        tracing::info!(path = %inventory_path, action = ?result.action, "inventory written");
    }
    Ok(result)
}

fn print_results(results: &[DirectoryScan]) {
    for result in results {
        if result.action == ScanAction::Skipped {
            continue;
        }
        println!(
            "{}  {} ({} files, {})",
            result.action.paint(format!("{:>10}", result.action.label())),
            result.directory.cyan(),
            result.files,
            human_bytes(result.bytes)
        );
        for failure in &result.failures {
            println!("            {} {}", "unreadable".red(), failure);
        }
        for change in &result.changes {
            let marker = if change.is_problem() { "!".red() } else { "~".dimmed() };
            println!("            {marker} {change}");
        }
    }

    let written = results
        .iter()
        .filter(|r| matches!(r.action, ScanAction::Created | ScanAction::Updated | ScanAction::Replaced))
        .count();
    let files: usize = results.iter().map(|r| r.files).sum();
    let bytes: u64 = results.iter().map(|r| r.bytes).sum();
    println!();
    println!(
        "{} {} inventories written, {} files, {}",
        "Done:".bold(),
        written,
        files,
        human_bytes(bytes)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use inv_fs::InventoryFile;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn scan(dir: &Path, replace: bool) -> DirectoryScan {
        let settings = Settings::default();
        let root = NormalizedPath::new(dir);
        scan_one(&settings, &root, "", &settings.scan_options(), replace).unwrap()
    }

    #[test]
    fn first_scan_creates_inventory() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.jpg", b"a");
        write(temp.path(), "notes.txt", b"n");

        let result = scan(temp.path(), false);

        assert_eq!(result.action, ScanAction::Created);
        assert_eq!(result.files, 1);
        assert!(temp.path().join(InventoryFile::Directory.as_str()).is_file());
    }

    #[test]
    fn rescan_of_untouched_directory_is_unchanged() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.jpg", b"a");
        scan(temp.path(), false);

        assert_eq!(scan(temp.path(), false).action, ScanAction::Unchanged);
    }

    #[test]
    fn changed_content_is_kept_unless_replaced() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.jpg", b"a");
        scan(temp.path(), false);
        write(temp.path(), "a.jpg", b"b");

        let kept = scan(temp.path(), false);
        assert_eq!(kept.action, ScanAction::Kept);
        assert_eq!(kept.changes.len(), 1);

        assert_eq!(scan(temp.path(), true).action, ScanAction::Replaced);
        assert_eq!(scan(temp.path(), false).action, ScanAction::Unchanged);
    }

    #[test]
    fn empty_directory_is_skipped() {
        let temp = TempDir::new().unwrap();
        assert_eq!(scan(temp.path(), false).action, ScanAction::Skipped);
        assert!(!temp.path().join(InventoryFile::Directory.as_str()).exists());
    }

    #[test]
    fn recursive_scan_covers_subdirectories() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "2019/a.jpg", b"a");
        write(temp.path(), "2020/b.jpg", b"b");
        let args = ScanArgs {
            recursive: true,
            ..ScanArgs::default()
        };
        let settings = Settings::default();

        let results = scan_tree(&settings, temp.path(), &settings.scan_options(), &args).unwrap();

        let created: Vec<ScanAction> = results.iter().map(|r| r.action).collect();
        assert_eq!(created, vec![ScanAction::Skipped, ScanAction::Created, ScanAction::Created]);
        assert!(temp.path().join("2019/inventory.json").is_file());
        assert!(temp.path().join("2020/inventory.json").is_file());
    }
}
