//! Deterministic password digests.
//!
//! The username is the salt: the same password yields different digests for
//! different users, but the same digest every time for a given user.

use base64ct::{Base64, Encoding};
use sha2::{Digest, Sha256};

/// Hash a plaintext password for `username`.
#[must_use]
pub fn hash_password(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    // separator keeps ("ab", "c") and ("a", "bc") apart
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    Base64::encode_string(&hasher.finalize())
}

/// Compare a freshly computed digest with the stored one.
#[must_use]
pub fn verify(candidate: &str, stored: &str) -> bool {
    candidate == stored
}
