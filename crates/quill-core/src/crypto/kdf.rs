//! Key derivation using PBKDF2-HMAC-SHA-512.
//!
//! This module turns an account password and per-account salt into the
//! 256-bit content encryption key. Derivation is deterministic so the
//! same credentials always reopen the same content.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use zeroize::ZeroizeOnDrop;

use crate::error::{Result, VaultError};

/// PBKDF2 iteration count.
///
/// Fixed for the lifetime of a vault: every record is tagged with
/// key version 1, and changing this constant would orphan existing
/// ciphertexts. A future format version can raise it alongside a
/// re-encryption migration.
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// Length of derived key in bytes (32 bytes = 256 bits for AES-256).
pub const KEY_LENGTH: usize = 32;

/// Length of the per-account salt in bytes (128 bits).
pub const SALT_LENGTH: usize = 16;

/// A content encryption key derived from a password.
///
/// This type ensures that key material is securely zeroized from memory
/// when dropped, reducing the window of exposure.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    /// The raw key bytes (zeroized on drop)
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Create a `DerivedKey` from raw bytes.
    ///
    /// # Security
    ///
    /// The caller is responsible for ensuring the bytes come from a
    /// secure source, either [`derive_key`] or a trusted store.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Parse a key from its lowercase hex encoding.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Derivation`] if the input is not valid hex
    /// or does not decode to exactly [`KEY_LENGTH`] bytes.
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded)
            .map_err(|_| VaultError::Derivation("key is not valid hex".to_string()))?;
        let key: [u8; KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| VaultError::Derivation("key must be 32 bytes".to_string()))?;
        Ok(Self { key })
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate
    /// encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Hex-encode the key for persistence or session carriage.
    pub fn to_hex(&self) -> String {
        hex::encode(self.key)
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.key.ct_eq(&other.key).into()
    }
}

impl Eq for DerivedKey {}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh random salt for a new account.
///
/// # Errors
///
/// Returns [`VaultError::Derivation`] if the operating system RNG fails.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH]> {
    let mut salt = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt)
        .map_err(|e| VaultError::Derivation(format!("Failed to generate salt: {}", e)))?;
    Ok(salt)
}

/// Derive a content encryption key from a password and salt.
///
/// # Arguments
///
/// * `password` - The account password
/// * `salt` - The per-account salt stored alongside the credential record
///
/// # Returns
///
/// Returns a `DerivedKey` suitable for AES-256 operations.
///
/// # Errors
///
/// Returns [`VaultError::Derivation`] if the password is empty or the
/// salt is shorter than [`SALT_LENGTH`] bytes. Callers validate input
/// before reaching this point, so either case indicates a bug upstream.
///
/// # Security
///
/// - Same password + salt always produces the same key (deterministic)
/// - Different salt produces a different key (salt is stored with the account)
/// - 600,000 PBKDF2 rounds slow offline brute-force of the password
pub fn derive_key(password: &str, salt: &[u8]) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(VaultError::Derivation(
            "Password cannot be empty".to_string(),
        ));
    }

    if salt.len() < SALT_LENGTH {
        return Err(VaultError::Derivation(format!(
            "Salt must be at least {} bytes",
            SALT_LENGTH
        )));
    }

    let mut key_bytes = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key_bytes);

    Ok(DerivedKey::from_bytes(key_bytes))
}
