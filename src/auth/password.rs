//! Password hashing utilities
//!
//! Credentials are unsalted SHA-256 digests of the UTF-8 password,
//! persisted hex-encoded and compared byte-for-byte. This reproduces the
//! legacy credential format on purpose; see DESIGN.md before deploying
//! anywhere real — a salted, memory-hard scheme (argon2/scrypt) should
//! replace it, at the cost of a credential migration.

use sha2::{Digest, Sha256};

/// Hash a password into a hex-encoded SHA-256 digest
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    hex::encode(digest)
}

/// Verify a password against a stored hex-encoded digest.
///
/// Returns `false` on any mismatch, including an undecodable or
/// wrong-length stored value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(stored_bytes) = hex::decode(stored) else {
        return false;
    };
    let digest = Sha256::digest(password.as_bytes());
    if stored_bytes.len() != digest.len() {
        return false;
    }
    digest.as_slice() == stored_bytes.as_slice()
}
