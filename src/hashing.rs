//! Hashing - SHA-256 Submission Digests
//!
//! The digest of a submission depends only on its values, never on the
//! order fields were declared or captured in.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// JSON with object keys sorted at every depth and no whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    // serde_json's default Map is ordered by key.
    let value = serde_json::to_value(value)?;
    serde_json::to_string(&value)
}

/// Digest of the submitted field values.
pub fn compute_submission_digest<T: Serialize>(values: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(values)?;
    Ok(sha256_hex(canonical.as_bytes()))
}
