//! Inventory Manager CLI
//!
//! Builds per-directory inventories of photo collections, merges them,
//! finds duplicates and plans reconciliation between two copies of a tree.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;
use inv_core::{Settings, SettingsResolver};
use inv_fs::NormalizedPath;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let settings = resolve_settings(&cli)?;
    execute_command(cli.command, &settings)
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    let mut resolver = SettingsResolver::new(NormalizedPath::new(cwd));
    if let Some(config) = &cli.config {
        resolver = resolver.with_config_file(NormalizedPath::new(config));
    }
    Ok(resolver.resolve()?)
}

fn execute_command(cmd: Commands, settings: &Settings) -> Result<()> {
    match cmd {
        Commands::Scan {
            dirs,
            recursive,
            all_files,
            replace,
            workers,
            json,
        } => commands::run_scan(
            settings,
            &dirs,
            &commands::ScanArgs {
                recursive,
                all_files,
                replace,
                workers,
                json,
            },
        ),
        Commands::Merge { root, output, json } => commands::run_merge(settings, &root, output.as_deref(), json),
        Commands::Dedupe {
            inventories,
            policy,
            script,
            root,
            json,
        } => commands::run_dedupe(
            settings,
            &inventories,
            &commands::DedupeArgs {
                policy,
                script,
                root,
                json,
            },
        ),
        Commands::Diff {
            left,
            right,
            direction,
            only_copy,
            only_delete,
            move_policy,
            script,
            left_root,
            right_root,
            json,
        } => commands::run_diff(
            settings,
            &left,
            &right,
            &commands::DiffArgs {
                direction,
                only_copy,
                only_delete,
                move_policy,
                script,
                left_root,
                right_root,
                json,
            },
        ),
        Commands::Verify {
            dir,
            approve_add,
            approve_remove,
            json,
        } => commands::run_verify(settings, &dir, &approve_add, &approve_remove, json),
    }
}
