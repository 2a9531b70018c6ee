//! Filter hashing for cursor consistency checks.
//!
//! A cursor minted under one title filter must not continue a walk under
//! another; the hash of the normalized filter travels inside the cursor and
//! is compared on every page.

use sha2::{Digest, Sha256};

/// Normalize the title filter for hashing. Matching is case-insensitive, so
/// the hash is too.
fn normalize_title_filter(title: &str) -> String {
    format!("TITLE_CONTAINS({})", title.trim().to_lowercase())
}

/// Generate a short hash from the list filter for cursor consistency checks.
/// Returns a 16-character hex string (64-bit hash), or `None` when there is
/// no filter.
#[must_use]
pub fn short_filter_hash(title: Option<&str>) -> Option<String> {
    title.map(|t| {
        let normalized = normalize_title_filter(t);
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        let bytes = hasher.finalize();
        hex::encode(&bytes[..8]) // Take first 8 bytes for 64-bit hash
    })
}
