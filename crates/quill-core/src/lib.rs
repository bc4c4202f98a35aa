//! # Quill Core
//!
//! Core library for Quill - a single-account encrypted note vault.
//!
//! This crate provides the credential and content encryption subsystem,
//! the session machinery and the storage abstractions independent of the
//! CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: Password digests, key derivation and content encryption
//! - **session**: Signed tokens that carry the content key between calls
//! - **store**: Credential and note persistence over SQLite
//! - **service**: Vault operations (setup, login, note CRUD)
//!
//! ## Security model
//!
//! One account per vault. The account password is stored as a SHA-256
//! digest and, separately, stretched into a 256-bit AES key at setup.
//! Note content is encrypted with that key; titles and tags stay in the
//! clear. Sessions carry the key inside a signed token so no operation
//! after login ever sees the password again.

pub mod crypto;
pub mod error;
pub mod service;
pub mod session;
pub mod store;

pub use crypto::{decrypt, derive_key, encrypt, generate_salt, hash_password, verify_password};
pub use crypto::{DerivedKey, Sealed};
pub use error::{Result, VaultError};
pub use service::{Note, NoteChanges, NoteDraft, Vault, VaultOptions};
pub use session::{SessionClaims, SessionSigner, SessionToken, DEFAULT_SESSION_TTL_SECS};
pub use store::{acquire_store, reset_store_cache, SqliteStore, StoreCache};
pub use store::{Account, ContentStore, CredentialStore};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
