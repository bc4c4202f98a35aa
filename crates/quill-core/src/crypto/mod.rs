//! Cryptographic operations for Quill.
//!
//! This module provides the three primitives the vault is built on:
//! - **SHA-256 digests** for password verification ([`digest`])
//! - **PBKDF2-HMAC-SHA-512** key derivation ([`kdf`])
//! - **AES-256-CBC with PKCS#7 padding** content encryption ([`cipher`])
//!
//! ## Security Model
//!
//! - The password digest gates access; the derived key unlocks content.
//!   The two are computed independently so a stolen digest does not
//!   reveal the content key.
//! - Key material lives in [`kdf::DerivedKey`], which zeroizes on drop
//!   and redacts itself from `Debug` output.
//! - Ciphertexts carry no integrity tag. CBC mode detects some tampering
//!   through padding failures but can let a forged ciphertext decrypt to
//!   silently corrupted plaintext. See [`cipher`] for details.
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the vault database (content is encrypted, password is digested)
//! - Offline brute-force against the derived key (PBKDF2 work factor)
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to an unlocked session or process memory
//! - Active ciphertext tampering (no authentication tag)

pub mod cipher;
pub mod digest;
pub mod kdf;

pub use cipher::{decrypt, encrypt, Sealed};
pub use digest::{hash_password, verify_password};
pub use kdf::{derive_key, generate_salt, DerivedKey};
