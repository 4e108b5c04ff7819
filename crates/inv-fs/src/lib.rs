//! Filesystem layer for Inventory Manager
//!
//! Provides normalized paths, SHA-256 checksums, atomic document I/O and the
//! reference directory scanner that produces raw inventory listings.

pub mod checksum;
pub mod constants;
pub mod document;
pub mod error;
pub mod io;
pub mod path;
pub mod scan;

pub use constants::{InventoryFile, MEDIA_EXTENSIONS};
pub use document::{DocumentFormat, DocumentStore};
pub use error::{Error, Result};
pub use path::{NormalizedPath, PathIssue, check_relative, join_relative, parent_of};
pub use scan::{FilterSummary, ScanFailure, ScanOptions, ScanOutcome, ScannedFile, list_directories, scan_directory};
