//! Password digests using SHA-256.
//!
//! The vault stores a lowercase hex SHA-256 digest of the account password
//! and compares digests in constant time during login.
//!
//! ## Known weakness
//!
//! The digest is a single unsalted hash round. Identical passwords produce
//! identical digests, and a leaked digest is open to offline dictionary
//! attack at raw SHA-256 speed. A future format version should move
//! verification to a salted, tunable password hash (the PBKDF2 machinery
//! in [`crate::crypto::kdf`] is already in the tree). Until then the
//! digest only ever gates access; it is never used as key material.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compute the stored digest for a password.
///
/// # Arguments
///
/// * `password` - The cleartext password
///
/// # Returns
///
/// Returns the lowercase hex encoding of `SHA-256(password)`, always
/// 64 characters.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a presented password against a stored digest.
///
/// The comparison runs in constant time over the full digest length so
/// timing does not reveal how many leading characters matched.
///
/// # Arguments
///
/// * `password` - The cleartext password presented at login
/// * `stored_digest` - The hex digest persisted at setup
///
/// # Returns
///
/// Returns `true` only when the recomputed digest matches exactly.
pub fn verify_password(password: &str, stored_digest: &str) -> bool {
    let computed = hash_password(password);
    computed.as_bytes().ct_eq(stored_digest.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_hex_sha256() {
        // Known vector: SHA-256("abc")
        let digest = hash_password("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(hash_password("correct horse"), hash_password("correct horse"));
    }

    #[test]
    fn test_digest_length() {
        assert_eq!(hash_password("").len(), 64);
        assert_eq!(hash_password("Tr0ub4dor&3").len(), 64);
    }

    #[test]
    fn test_verify_accepts_matching_password() {
        let stored = hash_password("Tr0ub4dor&3");
        assert!(verify_password("Tr0ub4dor&3", &stored));
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let stored = hash_password("Tr0ub4dor&3");
        assert!(!verify_password("Tr0ub4dor&4", &stored));
    }

    #[test]
    fn test_verify_rejects_truncated_digest() {
        let stored = hash_password("Tr0ub4dor&3");
        assert!(!verify_password("Tr0ub4dor&3", &stored[..63]));
    }

    #[test]
    fn test_verify_rejects_empty_digest() {
        assert!(!verify_password("anything", ""));
    }
}
