//! Merge command implementation

use std::path::Path;

use colored::Colorize;
use inv_core::Settings;
use inv_core::store::{build_merged, save_merged};
use inv_fs::NormalizedPath;
use serde::Serialize;

use super::{display_dir, human_bytes, print_json};
use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
struct MergeSummary<'a> {
    output: &'a str,
    records: usize,
    bytes: u64,
    conflicts: &'a [inv_core::MergeConflict],
    coverage: &'a [inv_core::CoverageWarning],
    failures: &'a [inv_core::DirectoryFailure],
}

/// Run the merge command
pub fn run_merge(settings: &Settings, root: &Path, output: Option<&Path>, json: bool) -> Result<()> {
    let root = NormalizedPath::new(root);
    if !root.is_dir() {
        return Err(CliError::user(format!("'{root}' is not a directory")));
    }

    let outcome = build_merged(&root, &settings.inventory_file_name, settings.validation_options())?;
    let output = match output {
        Some(path) => NormalizedPath::new(path),
        None => root.join(&settings.merged_file_name),
    };
    save_merged(&outcome.inventory, &output)?;

    if json {
        return print_json(&MergeSummary {
            output: output.as_str(),
            records: outcome.inventory.len(),
            bytes: outcome.inventory.total_bytes(),
            conflicts: &outcome.conflicts,
            coverage: &outcome.coverage,
            failures: &outcome.failures,
        });
    }

    println!(
        "{} {} records ({}) into {}",
        "Merged".green().bold(),
        outcome.inventory.len(),
        human_bytes(outcome.inventory.total_bytes()),
        output.as_str().cyan()
    );

    if !outcome.conflicts.is_empty() {
        println!();
        println!("{}:", "Conflicts".bold());
        for conflict in &outcome.conflicts {
            let claimants: Vec<&str> = conflict.claims.iter().map(|c| display_dir(&c.directory)).collect();
            println!("  {} {} (claimed by {})", "!".red(), conflict.path, claimants.join(", "));
        }
    }
    if !outcome.coverage.is_empty() {
        println!();
        println!("{}:", "Coverage".bold());
        for warning in &outcome.coverage {
            println!("  {} {}", "?".yellow(), warning);
        }
    }
    if !outcome.failures.is_empty() {
        println!();
        println!("{}:", "Unusable inventories".bold());
        for failure in &outcome.failures {
            println!("  {} {}: {}", "x".red(), display_dir(&failure.directory), failure.message);
        }
    }
    Ok(())
}
