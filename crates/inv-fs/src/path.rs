//! Normalized path handling for cross-platform compatibility
//!
//! Two kinds of path flow through the workspace: on-disk paths (tree roots,
//! inventory files), carried as [`NormalizedPath`], and tree-relative record
//! paths, carried as plain `/`-separated strings and checked with
//! [`check_relative`].

use std::fmt;
use std::path::{Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Converts to platform-native form only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Backslashes become forward slashes and a trailing slash is dropped
    /// (except for the filesystem root itself).
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let mut normalized = path_str.replace('\\', "/");
        while normalized.len() > 1 && normalized.ends_with('/') {
            normalized.pop();
        }
        Self { inner: normalized }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a `/`-separated relative segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let segment_normalized = segment_normalized.trim_start_matches('/');
        if segment_normalized.is_empty() {
            return self.clone();
        }
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self { inner: joined }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }

    /// Express `self` relative to `root`.
    ///
    /// Returns `Some("")` when both are the same directory and `None` when
    /// `self` does not live under `root`.
    pub fn relative_to(&self, root: &NormalizedPath) -> Option<String> {
        if self.inner == root.inner {
            return Some(String::new());
        }
        let prefix = if root.inner.ends_with('/') {
            root.inner.clone()
        } else {
            format!("{}/", root.inner)
        };
        self.inner
            .strip_prefix(&prefix)
            .map(|rest| rest.trim_start_matches('/').to_string())
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Reasons a tree-relative path is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathIssue {
    Empty,
    Absolute,
    DotSegment,
    EmptySegment,
    Backslash,
}

impl fmt::Display for PathIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Empty => "path is empty",
            Self::Absolute => "path is absolute",
            Self::DotSegment => "path contains a '.' or '..' segment",
            Self::EmptySegment => "path contains an empty segment",
            Self::Backslash => "path contains a backslash",
        };
        f.write_str(text)
    }
}

/// Check that `path` is a clean, `/`-separated relative path.
pub fn check_relative(path: &str) -> Result<(), PathIssue> {
    if path.is_empty() {
        return Err(PathIssue::Empty);
    }
    if path.contains('\\') {
        return Err(PathIssue::Backslash);
    }
    if path.starts_with('/') || (path.len() > 1 && path.as_bytes()[1] == b':') {
        return Err(PathIssue::Absolute);
    }
    for segment in path.split('/') {
        match segment {
            "" => return Err(PathIssue::EmptySegment),
            "." | ".." => return Err(PathIssue::DotSegment),
            _ => {}
        }
    }
    Ok(())
}

/// Join a tree-relative directory and a name. An empty directory is the root.
pub fn join_relative(directory: &str, name: &str) -> String {
    let directory = directory.trim_end_matches('/');
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", directory, name)
    }
}

/// Parent directory of a tree-relative path; the root is `""`.
pub fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Lowercased extension of a file name including the leading dot,
/// e.g. `".jpg"`. Dot-files and names without a dot have none.
pub fn dotted_extension(name: &str) -> Option<String> {
    let base = name.rsplit('/').next().unwrap_or(name);
    let idx = base.rfind('.')?;
    if idx == 0 {
        None
    } else {
        Some(base[idx..].to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_to_strips_root() {
        let root = NormalizedPath::new("/photos");
        let dir = NormalizedPath::new("/photos/2019/trip/");
        assert_eq!(dir.relative_to(&root).as_deref(), Some("2019/trip"));
        assert_eq!(root.relative_to(&root).as_deref(), Some(""));
        assert_eq!(
            NormalizedPath::new("/photosets/x").relative_to(&root),
            None
        );
    }

    #[test]
    fn join_relative_handles_root() {
        assert_eq!(join_relative("", "a.jpg"), "a.jpg");
        assert_eq!(join_relative("2019/", "a.jpg"), "2019/a.jpg");
    }

    #[test]
    fn dotted_extension_is_lowercase() {
        assert_eq!(dotted_extension("IMG_1.JPG").as_deref(), Some(".jpg"));
        assert_eq!(dotted_extension(".hidden"), None);
        assert_eq!(dotted_extension("dir.d/README"), None);
    }
}
