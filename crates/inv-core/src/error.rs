//! Error types for inv-core

use crate::validate::ValidationIssue;

/// Result type for inv-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in inv-core operations
///
/// Divergent data between inventories is never an error: conflicts,
/// coverage gaps and anomalies are reported as values. Only structurally
/// unusable input and bad options end up here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An inventory failed validation; every issue found is listed
    #[error("Malformed inventory for directory '{directory}': {} issue(s)", .issues.len())]
    MalformedInventory {
        directory: String,
        issues: Vec<ValidationIssue>,
    },

    /// A merged inventory document has an unknown format marker
    #[error("Unsupported merged inventory format: {format}")]
    UnsupportedMergedFormat { format: String },

    /// Settings file contains an unusable value
    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },

    /// Contradictory plan options
    #[error("Invalid plan options: {message}")]
    InvalidPlanOptions { message: String },

    /// Policy name not recognised
    #[error("Unknown {kind} policy: {name}")]
    UnknownPolicy { kind: &'static str, name: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from inv-fs
    #[error(transparent)]
    Fs(#[from] inv_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    /// Issues attached to a validation failure, empty for other errors.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::MalformedInventory { issues, .. } => issues,
            _ => &[],
        }
    }
}
