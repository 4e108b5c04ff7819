//! Well-known file names and extension sets.

use std::path::Path;

/// Files the inventory tools read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryFile {
    /// Per-directory inventory (`inventory.json`)
    Directory,
    /// Whole-tree merged inventory (`merged-inventory.json`)
    Merged,
    /// Local settings file (`inventory.toml`)
    Settings,
}

impl InventoryFile {
    /// Get the default file name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "inventory.json",
            Self::Merged => "merged-inventory.json",
            Self::Settings => "inventory.toml",
        }
    }
}

impl AsRef<Path> for InventoryFile {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for InventoryFile {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for InventoryFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Media extensions inventoried by default (lowercase, leading dot).
pub const MEDIA_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".tif", ".tiff", ".gif", ".mp4", ".mov", ".avi", ".wmv", ".mpg",
    ".cr2", ".mp3",
];

/// Upper bound on the default number of checksum workers.
pub const DEFAULT_MAX_WORKERS: usize = 4;
