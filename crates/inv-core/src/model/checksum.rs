//! Content identity key

use std::fmt;

use inv_fs::checksum::{HEX_LEN, compute_bytes_checksum, is_well_formed};
use serde::{Deserialize, Serialize};

/// A SHA-256 content digest in lowercase hex.
///
/// Equal checksums are treated as equal content everywhere in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checksum(String);

impl Checksum {
    /// Parse a rendered digest, normalizing upper-case hex to lower-case.
    pub fn parse(value: &str) -> Option<Self> {
        is_well_formed(value).then(|| Self(value.to_ascii_lowercase()))
    }

    /// Digest of in-memory content.
    pub fn of_bytes(content: &[u8]) -> Self {
        Self(compute_bytes_checksum(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, enough to tell digests apart in human output.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Checksum {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Rejected checksum text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChecksum(pub String);

impl fmt::Display for InvalidChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a {}-digit hex checksum", self.0, HEX_LEN)
    }
}

impl std::error::Error for InvalidChecksum {}

impl TryFrom<String> for Checksum {
    type Error = InvalidChecksum;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(InvalidChecksum(value))
    }
}

impl From<Checksum> for String {
    fn from(value: Checksum) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case() {
        let upper = "AB".repeat(32);
        let checksum = Checksum::parse(&upper).unwrap();
        assert_eq!(checksum.as_str(), "ab".repeat(32));
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(Checksum::parse("abc").is_none());
        assert!(Checksum::parse(&"z".repeat(64)).is_none());
        assert!(Checksum::parse(&format!("sha256:{}", "a".repeat(64))).is_none());
    }

    #[test]
    fn serde_rejects_malformed() {
        let err = serde_json::from_str::<Checksum>("\"nothex\"").unwrap_err();
        assert!(err.to_string().contains("not a 64-digit hex checksum"));
    }

    #[test]
    fn short_is_prefix() {
        let checksum = Checksum::of_bytes(b"hello world");
        assert_eq!(checksum.short(), "b94d27b9934d");
    }
}
