//! # Content Ids
//!
//! Deterministic 32-byte ids for human-readable keys.

use crate::domain::ContentId;
use sha3::{Digest, Keccak256};

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Id of a slug (`keccak256(utf8(slug))`).
pub fn id_from_slug(slug: &str) -> ContentId {
    ContentId::from_slug(slug)
}
