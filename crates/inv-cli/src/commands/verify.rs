//! Verify command implementation

use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use inv_core::model::RawDirectoryInventory;
use inv_core::store::load_directory_inventory;
use inv_core::validate::validate;
use inv_core::{ApprovalRules, Settings, ValidationOptions, VerifyReport, VerifyStatus, compare_inventories};
use inv_fs::{NormalizedPath, scan_directory};

use super::print_json;
use crate::error::{CliError, Result};

/// Run the verify command
pub fn run_verify(
    settings: &Settings,
    dir: &Path,
    approve_add: &[String],
    approve_remove: &[String],
    json: bool,
) -> Result<()> {
    let rules = ApprovalRules::new(
        settings.approve_add.iter().chain(approve_add),
        settings.approve_remove.iter().chain(approve_remove),
    );
    let report = verify_directory(settings, &NormalizedPath::new(dir), &rules)?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report, dir);
    }

    match report.status {
        VerifyStatus::Differences => Err(CliError::user(format!(
            "{} problem(s) in '{}'",
            report.problems().len(),
            dir.display()
        ))),
        VerifyStatus::Matched | VerifyStatus::Accepted => Ok(()),
    }
}

/// Compare the stored inventory of `dir` with a fresh scan. Nothing is
/// written.
pub fn verify_directory(settings: &Settings, dir: &NormalizedPath, rules: &ApprovalRules) -> Result<VerifyReport> {
    let inventory_path = dir.join(&settings.inventory_file_name);
    if !inventory_path.is_file() {
        return Err(CliError::user(format!(
            "no {} in '{dir}'; run `inv scan` first",
            settings.inventory_file_name
        )));
    }
    let stored = load_directory_inventory(&inventory_path, "", settings.validation_options())?;

    let outcome = scan_directory(dir, &settings.scan_options())?;
    for failure in &outcome.failures {
        eprintln!("{} could not read {}: {}", "warning:".yellow(), failure.name, failure.message);
    }
    let raw = RawDirectoryInventory::from_scan("", &outcome, Utc::now());
    let mut fresh = validate(raw, ValidationOptions::default())?;
    fresh.carry_metadata_from(&stored);

    Ok(compare_inventories(&stored, &fresh, rules))
}

fn print_report(report: &VerifyReport, dir: &Path) {
    let heading = match report.status {
        VerifyStatus::Matched => "OK".green().bold(),
        VerifyStatus::Accepted => "OK (with accepted changes)".green(),
        VerifyStatus::Differences => "DIFFERENCES".red().bold(),
    };
    println!("{} {}", heading, dir.display().to_string().cyan());
    for change in &report.changes {
        let marker = if change.is_problem() { "!".red() } else { "~".dimmed() };
        println!("  {marker} {change}");
    }
}
