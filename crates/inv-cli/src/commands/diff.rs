//! Diff command implementation

use std::path::{Path, PathBuf};

use colored::Colorize;
use inv_core::sync::{DiffOptions, PlanSummary, Tally, render_script};
use inv_core::{MovePolicy, Plan, PlanOptions, Settings, SyncDecision, SyncDirection, diff_with};
use inv_fs::NormalizedPath;
use serde::Serialize;

use super::{human_bytes, load_snapshot, print_json};
use crate::error::Result;

/// Flags of `inv diff`.
#[derive(Debug, Clone, Default)]
pub struct DiffArgs {
    pub direction: String,
    pub only_copy: bool,
    pub only_delete: bool,
    pub move_policy: Option<String>,
    pub script: Option<PathBuf>,
    pub left_root: Option<String>,
    pub right_root: Option<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct DiffOutput<'a> {
    left: &'a str,
    right: &'a str,
    move_policy: MovePolicy,
    decisions: Vec<&'a SyncDecision>,
    plan: &'a Plan,
}

/// Run the diff command
pub fn run_diff(settings: &Settings, left: &Path, right: &Path, args: &DiffArgs) -> Result<()> {
    let direction: SyncDirection = args.direction.parse()?;
    let move_policy = match &args.move_policy {
        Some(name) => name.parse::<MovePolicy>()?,
        None => settings.move_policy,
    };
    let plan_options = PlanOptions {
        direction,
        only_copy: args.only_copy,
        only_delete: args.only_delete,
    };
    plan_options.validate()?;

    let left = load_snapshot(left, settings)?;
    let right = load_snapshot(right, settings)?;

    let decisions = diff_with(&left, &right, &DiffOptions { move_policy });
    let plan = Plan::build(&decisions, &plan_options)?;

    if let Some(script_path) = &args.script {
        let left_root = args.left_root.as_deref().unwrap_or(left.tree_root());
        let right_root = args.right_root.as_deref().unwrap_or(right.tree_root());
        let script = render_script(&plan, left_root, right_root);
        inv_fs::io::write_text(&NormalizedPath::new(script_path), &script.to_text())?;
        for skipped in &script.skipped {
            eprintln!("{} left out of the script: {}", "warning:".yellow(), skipped);
        }
        if !args.json {
            println!(
                "{} {} command(s) to {}",
                "Wrote".green().bold(),
                script.lines.len(),
                script_path.display().to_string().cyan()
            );
        }
    }

    let changed: Vec<&SyncDecision> = decisions
        .iter()
        .filter(|d| !matches!(d, SyncDecision::Unchanged { .. }))
        .collect();

    if args.json {
        return print_json(&DiffOutput {
            left: left.tree_root(),
            right: right.tree_root(),
            move_policy,
            decisions: changed,
            plan: &plan,
        });
    }

    if changed.is_empty() {
        println!("{} ({} files)", "Both sides match".green(), left.len());
        return Ok(());
    }

    println!(
        "{} {} vs {}",
        "Differences".bold(),
        left.tree_root().cyan(),
        right.tree_root().cyan()
    );
    for decision in &changed {
        print_decision(decision);
    }
    println!();
    print_summary(&plan.summary, direction);
    Ok(())
}

fn print_decision(decision: &SyncDecision) {
    match decision {
        SyncDecision::Unchanged { .. } => {}
        SyncDecision::Conflict { path, left, right } => println!(
            "  {} {}  conflict: left {} bytes {}, right {} bytes {}",
            "!".red(),
            path,
            left.size,
            left.checksum.short(),
            right.size,
            right.checksum.short()
        ),
        SyncDecision::Move {
            left_path,
            right_path,
            rename_on,
            ..
        } => println!(
            "  {} {} <-> {}  move, rename on {}",
            "~".cyan(),
            left_path,
            right_path,
            rename_on.as_str()
        ),
        SyncDecision::AmbiguousMove {
            left_paths,
            right_paths,
            ..
        } => println!(
            "  {} [{}] <-> [{}]  ambiguous move",
            "?".yellow(),
            left_paths.join(", "),
            right_paths.join(", ")
        ),
        SyncDecision::CopyLeftToRight { record } => {
            println!("  {} {}  only on left", "<".green(), record.path)
        }
        SyncDecision::CopyRightToLeft { record } => {
            println!("  {} {}  only on right", ">".green(), record.path)
        }
        SyncDecision::MetadataOnlyDifference { path, .. } => {
            println!("  {} {}  metadata differs", "=".dimmed(), path)
        }
        SyncDecision::LocalCopy { side, from, to, .. } => println!(
            "  {} {}  copy of {} already on {}",
            "+".cyan(),
            to,
            from,
            side.as_str()
        ),
    }
}

fn print_summary(summary: &PlanSummary, direction: SyncDirection) {
    fn tally(label: &str, t: Tally) {
        if t.files > 0 {
            println!("  {label:<22} {:>6}  {}", t.files, human_bytes(t.bytes));
        }
    }

    println!("{} ({})", "Plan".bold(), direction.as_str().cyan());
    tally("copy to left", summary.copies_to_left);
    tally("copy to right", summary.copies_to_right);
    tally("delete on left", summary.deletes_on_left);
    tally("delete on right", summary.deletes_on_right);
    tally("local copy on left", summary.local_copies_on_left);
    tally("local copy on right", summary.local_copies_on_right);
    for (label, count) in [
        ("rename on left", summary.renames_on_left),
        ("rename on right", summary.renames_on_right),
    ] {
        if count > 0 {
            println!("  {label:<22} {count:>6}");
        }
    }
    if summary.needs_review > 0 {
        println!("  {} {:>6}", format!("{:<22}", "needs review").red(), summary.needs_review);
    }
}
