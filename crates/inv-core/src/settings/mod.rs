//! Settings resolution
//!
//! Settings come from TOML files merged in a fixed order, later sources
//! overriding earlier ones:
//!
//! 1. **Built-in defaults**
//! 2. **Global config** - `<config_dir>/inventory-manager/config.toml`
//! 3. **Local config** - `inventory.toml` in the working directory, or the
//!    file given with `--config`
//!
//! # Example
//!
//! ```ignore
//! use inv_core::settings::SettingsResolver;
//! use inv_fs::NormalizedPath;
//!
//! let settings = SettingsResolver::new(NormalizedPath::new(".")).resolve()?;
//! println!("inventory file: {}", settings.inventory_file_name);
//! ```

mod layer;
mod resolver;

pub use layer::SettingsLayer;
pub use resolver::SettingsResolver;

use inv_fs::{InventoryFile, ScanOptions};
use serde::Serialize;

use crate::dedupe::SurvivorPolicyKind;
use crate::sync::MovePolicy;
use crate::validate::ValidationOptions;
use crate::verify::ApprovalRules;
use crate::{Error, Result};

/// Largest accepted explicit worker count.
pub const MAX_WORKERS: usize = 64;

/// Effective settings after all layers are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Per-directory inventory file name
    pub inventory_file_name: String,
    /// Merged inventory file name
    pub merged_file_name: String,
    /// Inventory every regular file, not only media files
    pub include_all_files: bool,
    /// Checksum workers; `0` picks a default from the core count
    pub workers: usize,
    pub survivor_policy: SurvivorPolicyKind,
    pub move_policy: MovePolicy,
    /// Extensions whose additions are accepted by verification
    pub approve_add: Vec<String>,
    /// Extensions whose removals are accepted by verification
    pub approve_remove: Vec<String>,
    /// Reject inventories lacking capture dates or dimensions
    pub require_complete: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inventory_file_name: InventoryFile::Directory.as_str().to_string(),
            merged_file_name: InventoryFile::Merged.as_str().to_string(),
            include_all_files: false,
            workers: 0,
            survivor_policy: SurvivorPolicyKind::default(),
            move_policy: MovePolicy::default(),
            approve_add: Vec::new(),
            approve_remove: Vec::new(),
            require_complete: false,
        }
    }
}

impl Settings {
    /// Overwrite every value the layer sets.
    pub fn apply(&mut self, layer: SettingsLayer) {
        let SettingsLayer {
            inventory_file_name,
            merged_file_name,
            include_all_files,
            workers,
            survivor_policy,
            move_policy,
            approve_add,
            approve_remove,
            require_complete,
        } = layer;

        if let Some(v) = inventory_file_name {
            self.inventory_file_name = v;
        }
        if let Some(v) = merged_file_name {
            self.merged_file_name = v;
        }
        if let Some(v) = include_all_files {
            self.include_all_files = v;
        }
        if let Some(v) = workers {
            self.workers = v;
        }
        if let Some(v) = survivor_policy {
            self.survivor_policy = v;
        }
        if let Some(v) = move_policy {
            self.move_policy = v;
        }
        if let Some(v) = approve_add {
            self.approve_add = v;
        }
        if let Some(v) = approve_remove {
            self.approve_remove = v;
        }
        if let Some(v) = require_complete {
            self.require_complete = v;
        }
    }

    /// Check values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSettings`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        check_file_name("inventory_file_name", &self.inventory_file_name)?;
        check_file_name("merged_file_name", &self.merged_file_name)?;
        if self.workers > MAX_WORKERS {
            return Err(invalid(format!(
                "workers must be between 0 and {MAX_WORKERS}, got {}",
                self.workers
            )));
        }
        for (key, list) in [("approve_add", &self.approve_add), ("approve_remove", &self.approve_remove)] {
            if let Some(bad) = list.iter().find(|ext| !is_extension(ext)) {
                return Err(invalid(format!(
                    "{key} entries must look like '.jpg', got '{bad}'"
                )));
            }
        }
        Ok(())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            inventory_file_name: self.inventory_file_name.clone(),
            include_all_files: self.include_all_files,
            workers: self.workers,
        }
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            require_complete: self.require_complete,
        }
    }

    pub fn approval_rules(&self) -> ApprovalRules {
        ApprovalRules::new(&self.approve_add, &self.approve_remove)
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidSettings { message }
}

fn check_file_name(key: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(invalid(format!("{key} must be a plain file name, got '{name}'")));
    }
    if !name.to_lowercase().ends_with(".json") {
        return Err(invalid(format!("{key} must end in .json, got '{name}'")));
    }
    Ok(())
}

fn is_extension(ext: &str) -> bool {
    ext.len() > 1
        && ext.starts_with('.')
        && !ext[1..].contains(['.', '/', '\\', ' '])
}
