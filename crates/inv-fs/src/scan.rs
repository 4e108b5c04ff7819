//! Reference directory scanner
//!
//! Produces the raw listing behind a per-directory inventory: one entry per
//! media file directly inside a directory, with its size and SHA-256
//! checksum. Checksums are computed on a bounded worker pool; each worker
//! handles one file and shares nothing but the result collection.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::constants::{DEFAULT_MAX_WORKERS, InventoryFile, MEDIA_EXTENSIONS};
use crate::path::dotted_extension;
use crate::{Error, NormalizedPath, Result, checksum};

/// Label used in filter summaries for files without an extension.
pub const NO_EXTENSION: &str = "[no ext]";

/// Options controlling a directory scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Inventory file name, never listed as content
    pub inventory_file_name: String,
    /// Include every regular file instead of media files only
    pub include_all_files: bool,
    /// Checksum worker count; `0` picks `min(4, available cores)`
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            inventory_file_name: InventoryFile::Directory.as_str().to_string(),
            include_all_files: false,
            workers: 0,
        }
    }
}

impl ScanOptions {
    /// Effective worker count after applying the automatic default.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        cores.clamp(1, DEFAULT_MAX_WORKERS)
    }

    /// Decide whether a directory entry name belongs in the listing.
    pub fn accepts(&self, name: &str) -> bool {
        if name.starts_with('.') || name == self.inventory_file_name {
            return false;
        }
        if self.include_all_files {
            return true;
        }
        dotted_extension(name).is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// One scanned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// File name within the scanned directory
    pub name: String,
    pub size: u64,
    pub checksum: String,
}

/// A file that could not be identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub name: String,
    pub message: String,
}

/// Accepted and rejected file counts keyed by lowercase extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub passed: BTreeMap<String, usize>,
    pub rejected: BTreeMap<String, usize>,
}

impl FilterSummary {
    fn record(&mut self, name: &str, accepted: bool) {
        let key = dotted_extension(name).unwrap_or_else(|| NO_EXTENSION.to_string());
        let bucket = if accepted {
            &mut self.passed
        } else {
            &mut self.rejected
        };
        *bucket.entry(key).or_default() += 1;
    }

    /// Fold another summary into this one.
    pub fn absorb(&mut self, other: &FilterSummary) {
        for (ext, count) in &other.passed {
            *self.passed.entry(ext.clone()).or_default() += count;
        }
        for (ext, count) in &other.rejected {
            *self.rejected.entry(ext.clone()).or_default() += count;
        }
    }
}

/// Result of scanning one directory.
///
/// `files` is always a valid listing: files that failed are reported in
/// `failures` and left out rather than recorded with partial data.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub directory: NormalizedPath,
    /// Sorted by name
    pub files: Vec<ScannedFile>,
    pub failures: Vec<ScanFailure>,
    pub filter_summary: FilterSummary,
}

impl ScanOutcome {
    /// Total bytes across the identified files.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Scan the files directly inside `directory` (non-recursive).
///
/// # Errors
///
/// Fails only if the directory itself cannot be listed or the worker pool
/// cannot be built. Per-file errors land in [`ScanOutcome::failures`].
pub fn scan_directory(directory: &NormalizedPath, options: &ScanOptions) -> Result<ScanOutcome> {
    let native = directory.to_native();
    if !native.is_dir() {
        return Err(Error::NotADirectory { path: native });
    }

    let mut filter_summary = FilterSummary::default();
    let mut candidates: Vec<(String, PathBuf)> = Vec::new();

    for entry in fs::read_dir(&native).map_err(|e| Error::io(&native, e))? {
        let entry = entry.map_err(|e| Error::io(&native, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name == options.inventory_file_name {
            continue;
        }
        let accepted = options.accepts(&name);
        filter_summary.record(&name, accepted);
        if accepted {
            candidates.push((name, path));
        } else {
            debug!(file = %name, "filter reject");
        }
    }
    candidates.sort();

    let workers = options.effective_workers().min(candidates.len().max(1));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::WorkerPool {
            message: e.to_string(),
        })?;

    debug!(
        directory = %directory,
        files = candidates.len(),
        workers,
        "checksumming directory"
    );

    let results: Vec<std::result::Result<ScannedFile, ScanFailure>> = pool.install(|| {
        candidates
            .par_iter()
            .map(|(name, path)| identify(name, path))
            .collect()
    });

    let mut files = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(file) => files.push(file),
            Err(failure) => {
                warn!(file = %failure.name, error = %failure.message, "failed to identify file");
                failures.push(failure);
            }
        }
    }

    info!(
        directory = %directory,
        identified = files.len(),
        failed = failures.len(),
        "scanned directory"
    );

    Ok(ScanOutcome {
        directory: directory.clone(),
        files,
        failures,
        filter_summary,
    })
}

fn identify(name: &str, path: &std::path::Path) -> std::result::Result<ScannedFile, ScanFailure> {
    let failure = |e: std::io::Error| ScanFailure {
        name: name.to_string(),
        message: e.to_string(),
    };
    let size = fs::metadata(path).map_err(failure)?.len();
    let checksum = checksum::compute_file_checksum(path).map_err(failure)?;
    Ok(ScannedFile {
        name: name.to_string(),
        size,
        checksum,
    })
}

/// List every directory under `root` (including `root` itself as `""`),
/// tree-relative and sorted. Hidden directories and their contents are
/// skipped.
pub fn list_directories(root: &NormalizedPath) -> Result<Vec<String>> {
    let native = root.to_native();
    if !native.is_dir() {
        return Err(Error::NotADirectory { path: native });
    }
    let canonical_root = NormalizedPath::new(dunce::canonicalize(&native).map_err(|e| Error::io(&native, e))?);

    let mut directories = Vec::new();
    let walker = WalkDir::new(canonical_root.to_native())
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(|p| p.to_path_buf()).unwrap_or_else(|| native.clone());
            Error::io(path, std::io::Error::other(e.to_string()))
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let normalized = NormalizedPath::new(entry.path());
        if let Some(relative) = normalized.relative_to(&canonical_root) {
            directories.push(relative);
        }
    }

    directories.sort();
    Ok(directories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_accept_media_only() {
        let options = ScanOptions::default();
        assert!(options.accepts("IMG_0001.JPG"));
        assert!(options.accepts("clip.mov"));
        assert!(!options.accepts("notes.txt"));
        assert!(!options.accepts(".DS_Store"));
        assert!(!options.accepts("inventory.json"));
    }

    #[test]
    fn include_all_files_still_skips_hidden_and_inventory() {
        let options = ScanOptions {
            include_all_files: true,
            ..ScanOptions::default()
        };
        assert!(options.accepts("notes.txt"));
        assert!(!options.accepts(".hidden.jpg"));
        assert!(!options.accepts("inventory.json"));
    }

    #[test]
    fn effective_workers_is_bounded() {
        let auto = ScanOptions::default().effective_workers();
        assert!((1..=DEFAULT_MAX_WORKERS).contains(&auto));

        let fixed = ScanOptions {
            workers: 9,
            ..ScanOptions::default()
        };
        assert_eq!(fixed.effective_workers(), 9);
    }
}
