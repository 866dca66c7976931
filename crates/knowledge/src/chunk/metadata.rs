//! Chunk fingerprinting.

use sha2::{Digest, Sha256};

/// Calculate the hex SHA-256 digest of chunk text.
pub fn calculate_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
