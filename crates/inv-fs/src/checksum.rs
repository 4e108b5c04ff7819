//! SHA-256 checksum utilities
//!
//! Every inventory generation uses a single digest: SHA-256, rendered as 64
//! lowercase hexadecimal characters without any prefix. Distinct content is
//! assumed never to share a digest; the reconciliation engine relies on that
//! to treat equal checksums as equal content.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Name of the digest algorithm recorded alongside inventories.
pub const ALGORITHM: &str = "sha256";

/// Number of hex characters in a rendered checksum.
pub const HEX_LEN: usize = 64;

const READ_BUFFER: usize = 64 * 1024;

/// Compute the SHA-256 checksum of in-memory bytes.
pub fn compute_bytes_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
///
/// The file is streamed in fixed-size chunks so large images and videos are
/// never loaded into memory at once.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_file_checksum(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Returns true if `value` has the shape of a rendered checksum
/// (exactly [`HEX_LEN`] hex digits, either case).
pub fn is_well_formed(value: &str) -> bool {
    value.len() == HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}
