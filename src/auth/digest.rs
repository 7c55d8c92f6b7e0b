//! Password digesting and constant-time comparison.

use ring::digest::{digest, SHA256};

/// SHA-256 digest of a secret, rendered as lowercase hex.
pub fn sha256_hex(secret: &str) -> String {
    hex::encode(digest(&SHA256, secret.as_bytes()).as_ref())
}

/// Compare two strings in constant time.
///
/// Returns false immediately when the lengths differ; that leaks the length
/// and nothing else. For equal lengths every byte position is visited and
/// the XOR results are folded together, so there is no early exit on the
/// first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }

    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}
