//! Cryptographic utilities shared across Hyuga crates
//!
//! Provides SHA-256 digests over separator-joined fields. The separator and the
//! field order are part of the digest, so callers must keep both fixed.

use sha2::{Digest, Sha256};

/// Separator placed between fields before hashing
pub const FIELD_SEPARATOR: &str = "|";

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Hash `parts` joined with [`FIELD_SEPARATOR`] and return the lowercase hex digest.
pub fn joined_digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(FIELD_SEPARATOR.as_bytes());
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// True if `candidate` has the shape of a digest produced by [`joined_digest`].
pub fn is_digest(candidate: &str) -> bool {
    candidate.len() == DIGEST_HEX_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
