//! Dedupe command implementation

use std::path::PathBuf;

use colored::Colorize;
use inv_core::sync::render_removals;
use inv_core::{DedupeReport, MergedInventory, Settings, SurvivorPolicyKind, find_duplicates};
use inv_fs::NormalizedPath;

use super::{display_dir, human_bytes, load_snapshot, print_json};
use crate::error::{CliError, Result};

/// Flags of `inv dedupe`.
#[derive(Debug, Clone, Default)]
pub struct DedupeArgs {
    pub policy: Option<String>,
    pub script: Option<PathBuf>,
    pub root: Option<String>,
    pub json: bool,
}

/// Run the dedupe command
pub fn run_dedupe(settings: &Settings, inventories: &[PathBuf], args: &DedupeArgs) -> Result<()> {
    let kind = match &args.policy {
        Some(name) => name.parse::<SurvivorPolicyKind>()?,
        None => settings.survivor_policy,
    };

    let snapshots = inventories
        .iter()
        .map(|path| load_snapshot(path, settings))
        .collect::<Result<Vec<MergedInventory>>>()?;

    let policy = kind.policy();
    // Several trees are reported with each tree's root on every path.
    let (report, root) = match snapshots.as_slice() {
        [single] => (
            find_duplicates(single, policy.as_ref()),
            args.root.clone().unwrap_or_else(|| single.tree_root().to_string()),
        ),
        many => {
            if args.root.is_some() {
                return Err(CliError::user(
                    "--root only applies to a single inventory; paths from several trees keep their own roots",
                ));
            }
            (find_duplicates(many, policy.as_ref()), String::new())
        }
    };

    if let Some(script_path) = &args.script {
        let script = render_removals(&report.removals(), &root);
        inv_fs::io::write_text(&NormalizedPath::new(script_path), &script.to_text())?;
        for skipped in &script.skipped {
            eprintln!("{} left out of the script: {}", "warning:".yellow(), skipped);
        }
        if !args.json {
            println!(
                "{} {} removal(s) to {}",
                "Wrote".green().bold(),
                script.lines.len(),
                script_path.display().to_string().cyan()
            );
        }
    }

    if args.json {
        return print_json(&report);
    }
    print_report(&report, kind);
    Ok(())
}

fn print_report(report: &DedupeReport, kind: SurvivorPolicyKind) {
    if report.is_empty() {
        println!("{} among {} files", "No duplicates".green(), report.records_examined);
        return;
    }

    println!("{} (survivor policy: {})", "Duplicate groups".bold(), kind.as_str().cyan());
    for group in &report.groups {
        println!();
        println!(
            "  {} x{} ({} each)",
            group.checksum.short().dimmed(),
            group.member_count(),
            human_bytes(group.size)
        );
        if group.clear_choice {
            println!("    {} {}", "keep".green(), group.survivor.path);
        } else {
            println!(
                "    {} {} {}",
                "keep".yellow(),
                group.survivor.path,
                "(unclear choice, picked by path order)".yellow()
            );
        }
        for record in &group.removable {
            println!("    {} {}", "drop".red(), record.path);
        }
    }

    if !report.anomalies.is_empty() {
        println!();
        println!("{}:", "Same checksum, different size".bold());
        for anomaly in &report.anomalies {
            let paths: Vec<String> = anomaly
                .records
                .iter()
                .map(|r| format!("{} ({} bytes)", r.path, r.size))
                .collect();
            println!("  {} {}", "!".red(), paths.join(", "));
        }
    }

    let unclear = report.unclear_groups().count();
    if unclear > 0 {
        println!();
        println!(
            "{} {} group(s) had no clear survivor; review them before removing anything",
            "warning:".yellow(),
            unclear
        );
    }

    println!();
    println!("{}:", "Duplicates per directory".bold());
    for entry in report.duplicates_per_directory() {
        println!("  {:>6}  {}", entry.count, display_dir(&entry.directory));
    }

    println!();
    println!(
        "{} {} file(s) removable out of {}, {} reclaimable",
        "Summary:".bold(),
        report.removals().len(),
        report.records_examined,
        human_bytes(report.reclaimable_bytes())
    );
}
