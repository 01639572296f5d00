//! Content digests for generated artifacts.
//!
//! Two pipeline runs against the same header and libraries must produce
//! byte-identical artifacts; the digests make that visible in reports.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `bytes` as a lowercase hex string.
pub fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
