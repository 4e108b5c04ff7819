//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inventory Manager - track, dedupe and reconcile photo collections
#[derive(Parser, Debug)]
#[command(name = "inv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file to use instead of ./inventory.toml
    #[arg(long, global = true, value_name = "FILE", env = "INV_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create or refresh the inventory of each directory
    ///
    /// Existing inventories are compared with the fresh scan and only
    /// rewritten when nothing but approved changes were found, or when
    /// --replace is given.
    ///
    /// Examples:
    ///   inv scan ~/photos/2019            # one directory
    ///   inv scan -r ~/photos              # every directory below
    ///   inv scan --replace ~/photos/2019  # accept whatever changed
    Scan {
        /// Directories to scan
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Also scan every directory below the given ones
        #[arg(short, long)]
        recursive: bool,

        /// Inventory every file, not only media files
        #[arg(long)]
        all_files: bool,

        /// Overwrite inventories even when they differ
        #[arg(long)]
        replace: bool,

        /// Checksum workers (default: up to 4)
        #[arg(long, value_name = "N")]
        workers: Option<usize>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Merge every inventory under a tree into one snapshot
    Merge {
        /// Tree root
        root: PathBuf,

        /// Where to write the merged inventory (default: <ROOT>/merged-inventory.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Find duplicate content and suggest removals
    Dedupe {
        /// Merged inventory files or tree roots
        #[arg(required = true)]
        inventories: Vec<PathBuf>,

        /// Survivor policy: shortest-path or camera-name
        #[arg(long)]
        policy: Option<String>,

        /// Write `rm -f` commands for the suggested removals
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,

        /// Prefix for paths in the script (default: the tree root); single inventory only
        #[arg(long, value_name = "PATH")]
        root: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Compare two copies of a tree and plan how to reconcile them
    Diff {
        /// Left merged inventory or tree root
        left: PathBuf,

        /// Right merged inventory or tree root
        right: PathBuf,

        /// both, left-to-right or right-to-left
        #[arg(long, default_value = "both")]
        direction: String,

        /// Keep only copy operations
        #[arg(long, conflicts_with = "only_delete")]
        only_copy: bool,

        /// Keep only delete operations (needs a one-way direction)
        #[arg(long)]
        only_delete: bool,

        /// Move policy: preferred-path, canonical-left or canonical-right
        #[arg(long)]
        move_policy: Option<String>,

        /// Write shell commands for the plan
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,

        /// Prefix for left paths in the script (default: left tree root)
        #[arg(long, value_name = "PATH")]
        left_root: Option<String>,

        /// Prefix for right paths in the script (default: right tree root)
        #[arg(long, value_name = "PATH")]
        right_root: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Check a directory against its stored inventory
    Verify {
        /// Directory to verify
        dir: PathBuf,

        /// Extensions whose new files are accepted, e.g. .jpg,.png
        #[arg(long, value_delimiter = ',', value_name = "EXT")]
        approve_add: Vec<String>,

        /// Extensions whose missing files are accepted
        #[arg(long, value_delimiter = ',', value_name = "EXT")]
        approve_remove: Vec<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
