//! Content hashing: canonical bytes to event identifiers.
//!
//! The identifier is the unkeyed 32-byte BLAKE3 digest of the canonical
//! bytes, with no prefix or domain tag.

use crate::types::EventId;

/// Name of the digest algorithm, as written in vector files.
pub const HASH_ALGORITHM: &str = "blake3-256";

/// Derives a fixed-length identifier from canonical bytes.
pub trait ContentHasher: Send + Sync {
    fn digest(&self, canonical: &[u8]) -> EventId;
}

/// The reference hasher: BLAKE3 with 32-byte output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn digest(&self, canonical: &[u8]) -> EventId {
        hash_canonical(canonical)
    }
}

/// Compute the Blake3 hash of canonical bytes.
pub fn hash_canonical(canonical: &[u8]) -> EventId {
    EventId(*blake3::hash(canonical).as_bytes())
}
