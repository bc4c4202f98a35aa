//! Application context and vault opening for the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use secrecy::SecretString;

use quill_core::{acquire_store, SessionToken, SqliteStore, Vault, VaultError, VaultOptions};
use quill_core::DEFAULT_SESSION_TTL_SECS;

use crate::cli::Cli;
use crate::config::{default_config_path, default_vault_path, read_config, QuillConfig};
use crate::constants::exit_codes;
use crate::session::{clear_session, load_session, session_file_path};

/// Application context that bundles CLI args with lazily-loaded config.
///
/// This avoids repeatedly loading config and threading multiple parameters
/// through handler functions.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<QuillConfig>>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Get the parsed config file, loading it lazily. A missing config
    /// file is not an error; every value has a default.
    pub fn config(&self) -> anyhow::Result<Option<&QuillConfig>> {
        let slot = self
            .config
            .get_or_try_init(|| -> anyhow::Result<Option<QuillConfig>> {
                let path = resolve_config_path()?;
                if path.exists() {
                    Ok(Some(read_config(&path)?))
                } else {
                    Ok(None)
                }
            })?;
        Ok(slot.as_ref())
    }

    /// Resolve the vault path: --vault / QUILL_VAULT, then config, then
    /// the XDG default.
    pub fn vault_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = self.cli.vault.clone() {
            return Ok(PathBuf::from(path));
        }
        if let Some(config) = self.config()? {
            return Ok(PathBuf::from(config.vault.path.clone()));
        }
        default_vault_path()
    }

    /// Session lifetime in seconds, from config or the built-in default.
    pub fn session_ttl_seconds(&self) -> anyhow::Result<i64> {
        Ok(self
            .config()?
            .map(|config| config.session.ttl_seconds)
            .unwrap_or(DEFAULT_SESSION_TTL_SECS))
    }

    /// The expected setup token, from config `[setup]` or QUILL_SETUP_TOKEN.
    pub fn configured_setup_token(&self) -> anyhow::Result<Option<String>> {
        if let Some(config) = self.config()? {
            if let Some(setup) = &config.setup {
                if !setup.token.trim().is_empty() {
                    return Ok(Some(setup.token.clone()));
                }
            }
        }
        if let Ok(value) = std::env::var("QUILL_SETUP_TOKEN") {
            if !value.trim().is_empty() {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn vault_options(&self) -> anyhow::Result<VaultOptions> {
        let mut options = VaultOptions::new().with_session_ttl(self.session_ttl_seconds()?);
        if let Some(token) = self.configured_setup_token()? {
            options = options.with_setup_token(SecretString::from(token));
        }
        Ok(options)
    }

    /// Open the vault at the resolved path.
    ///
    /// Fails with a quickstart hint when the vault file does not exist;
    /// `setup` is the only command that may create it.
    pub fn open_vault(&self) -> anyhow::Result<Vault<Arc<SqliteStore>>> {
        let path = self.vault_path()?;
        if !path.exists() {
            return Err(anyhow::anyhow!(missing_vault_message(&path)));
        }
        let store = acquire_store(&path)?;
        Ok(Vault::new(store, self.vault_options()?)?)
    }

    /// Open the vault for setup, creating the parent directory and the
    /// database file as needed.
    pub fn open_vault_for_setup(&self) -> anyhow::Result<Vault<Arc<SqliteStore>>> {
        let path = self.vault_path()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to create vault directory {}: {}",
                        parent.display(),
                        e
                    )
                })?;
            }
        }
        let store = acquire_store(&path)?;
        Ok(Vault::new(store, self.vault_options()?)?)
    }
}

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("QUILL_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

pub fn missing_vault_message(path: &Path) -> String {
    format!(
        "No vault found at {}\n\nRun:\n  quill setup\n\nOr point at an existing vault:\n  QUILL_VAULT=/path/to/quill.db quill login",
        path.display()
    )
}

pub fn exit_auth_failed(message: &str, hint: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("{}", hint);
    std::process::exit(exit_codes::AUTH_FAILED);
}

pub fn exit_not_found_with_hint(message: &str, hint: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("{}", hint);
    std::process::exit(exit_codes::NOT_FOUND);
}

/// Load the saved session token, or exit asking the user to log in.
pub fn require_session() -> anyhow::Result<SessionToken> {
    let path = session_file_path()?;
    match load_session(&path)? {
        Some(token) => Ok(token),
        None => exit_auth_failed(
            "Not logged in.",
            "Hint: Run `quill login` to start a session.",
        ),
    }
}

/// Map vault errors to the CLI's exit conventions.
///
/// Session errors clear the stale session file and exit with the auth
/// code; missing notes exit with the not-found code. Everything else
/// propagates to anyhow.
pub fn unwrap_vault_result<T>(result: quill_core::Result<T>) -> anyhow::Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err @ (VaultError::SessionInvalid | VaultError::SessionExpired)) => {
            if let Ok(path) = session_file_path() {
                let _ = clear_session(&path);
            }
            exit_auth_failed(
                &err.to_string(),
                "Hint: Run `quill login` to start a new session.",
            );
        }
        Err(VaultError::NoteNotFound(id)) => exit_not_found_with_hint(
            &format!("Note {} not found", id),
            "Hint: Run `quill list` to find note IDs.",
        ),
        Err(VaultError::Authentication) => exit_auth_failed(
            "Authentication failed.",
            "Hint: Check your email and password.",
        ),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::missing_vault_message;

    #[test]
    fn test_missing_vault_message_copy() {
        let message = missing_vault_message(std::path::Path::new("/tmp/quill.db"));
        assert!(message.contains("No vault found at /tmp/quill.db"));
        assert!(message.contains("quill setup"));
        assert!(message.contains("QUILL_VAULT="));
    }
}
