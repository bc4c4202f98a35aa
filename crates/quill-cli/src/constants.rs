//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (vault, note).
    pub const NOT_FOUND: i32 = 3;

    /// Authentication failed (wrong password, bad setup token, missing or
    /// expired session).
    pub const AUTH_FAILED: i32 = 5;
}
