use sha2::{Digest, Sha256};

/// SHA-256 of the file bytes, lowercase hex. Used as the history index key.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
