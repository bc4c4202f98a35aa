//! Error types for Quill core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for Quill operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Core error type for Quill operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Presented credentials (password, digest or setup token) did not match.
    ///
    /// Deliberately carries no detail: callers must not be able to tell
    /// an unknown email from a wrong password.
    #[error("Authentication failed")]
    Authentication,

    /// Setup was attempted but the vault already holds its single account.
    #[error("An account already exists in this vault")]
    AccountExists,

    /// No account has been set up yet.
    #[error("No account exists in this vault")]
    AccountNotFound,

    /// Key derivation failed
    #[error("Key derivation error: {0}")]
    Derivation(String),

    /// Encryption failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Decryption failed. The detail field stays out of the display
    /// string so messages shown to users never leak ciphertext internals.
    #[error("Cannot read note content")]
    Decryption { detail: String },

    /// Session token was malformed or its signature did not verify.
    #[error("Session is not valid")]
    SessionInvalid,

    /// Session token was well-formed but past its expiry.
    #[error("Session has expired")]
    SessionExpired,

    /// Note not found (or not owned by the session account)
    #[error("Note not found: {0}")]
    NoteNotFound(Uuid),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Underlying SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::InvalidInput(err.to_string())
    }
}
