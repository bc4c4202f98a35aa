//! Vault operations: setup, login and note CRUD.
//!
//! [`Vault`] is the seam between the pure crypto primitives and the
//! storage traits. Every content operation takes a session token,
//! verifies it, and uses the key carried inside; nothing here ever
//! re-derives the key from a password after setup.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::crypto::cipher::{decrypt, encrypt};
use crate::crypto::digest::{hash_password, verify_password};
use crate::crypto::kdf::{derive_key, generate_salt, DerivedKey};
use crate::error::{Result, VaultError};
use crate::session::{SessionClaims, SessionSigner, SessionToken, DEFAULT_SESSION_TTL_SECS};
use crate::store::{
    Account, ContentStore, CredentialStore, NewAccount, NewNoteRecord, NoteRecord,
    NoteRecordUpdate,
};

/// Minimum password length accepted at setup.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Configuration for a [`Vault`].
#[derive(Clone)]
pub struct VaultOptions {
    /// Seconds a session token stays valid after login.
    pub session_ttl_secs: i64,

    /// The pre-shared token that authorizes account setup.
    /// Setup is refused entirely when this is `None`.
    pub setup_token: Option<SecretString>,
}

impl Default for VaultOptions {
    fn default() -> Self {
        Self {
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            setup_token: None,
        }
    }
}

impl VaultOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_ttl(mut self, secs: i64) -> Self {
        self.session_ttl_secs = secs;
        self
    }

    pub fn with_setup_token(mut self, token: SecretString) -> Self {
        self.setup_token = Some(token);
        self
    }
}

/// A decrypted note as handed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    /// Unique identifier
    pub id: Uuid,

    /// Note title
    pub title: String,

    /// Decrypted content
    pub content: String,

    /// Tags
    pub tags: Vec<String>,

    /// Key version the content was sealed with
    pub key_version: i32,

    /// When the note was created
    pub created_at: DateTime<Utc>,

    /// When the note was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a note.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    /// Note title (required, stored in the clear)
    pub title: String,

    /// Note content (encrypted before persisting; may be empty)
    pub content: String,

    /// Tags
    pub tags: Vec<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Partial changes to an existing note.
///
/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    /// Replacement title
    pub title: Option<String>,

    /// Replacement content (re-encrypted under a fresh IV)
    pub content: Option<String>,

    /// Replacement tag set
    pub tags: Option<Vec<String>>,
}

impl NoteChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }
}

/// The vault service: account lifecycle and encrypted note CRUD.
pub struct Vault<S> {
    store: S,
    signer: SessionSigner,
    session_ttl_secs: i64,
    setup_token: Option<SecretString>,
}

impl<S: CredentialStore + ContentStore> Vault<S> {
    /// Build a vault over an opened store.
    ///
    /// Loads the deployment record and its session signing secret, so
    /// tokens issued before a restart stay valid afterwards.
    pub fn new(store: S, options: VaultOptions) -> Result<Self> {
        let deployment = store.deployment()?;
        let signer = SessionSigner::from_bytes(&deployment.session_secret)?;

        Ok(Self {
            store,
            signer,
            session_ttl_secs: options.session_ttl_secs,
            setup_token: options.setup_token,
        })
    }

    /// Whether the vault's single account has been created yet.
    pub fn has_account(&self) -> Result<bool> {
        Ok(self.store.account_count()? > 0)
    }

    /// Create the vault's single account.
    ///
    /// # Arguments
    ///
    /// * `presented_token` - The setup token supplied by the caller
    /// * `email` - Login email for the new account
    /// * `password` - Account password; also the input to key derivation
    ///
    /// # Returns
    ///
    /// Returns the UUID of the created account.
    ///
    /// # Errors
    ///
    /// - `VaultError::InvalidInput` if no setup token is configured or
    ///   the email/password fail validation
    /// - `VaultError::Authentication` if the presented token does not match
    /// - `VaultError::AccountExists` if the vault already has its account
    pub fn setup(&self, presented_token: &str, email: &str, password: &str) -> Result<Uuid> {
        let expected = self.setup_token.as_ref().ok_or_else(|| {
            VaultError::InvalidInput("Setup token is not configured".to_string())
        })?;
        let matches: bool = presented_token
            .as_bytes()
            .ct_eq(expected.expose_secret().as_bytes())
            .into();
        if !matches {
            tracing::debug!("setup token mismatch");
            return Err(VaultError::Authentication);
        }

        if self.store.account_count()? > 0 {
            return Err(VaultError::AccountExists);
        }

        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(VaultError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }

        let digest = hash_password(password);
        let salt = generate_salt()?;
        let key = derive_key(password, &salt)?;

        let id = self
            .store
            .insert_account(&NewAccount::new(email, digest, salt.to_vec(), key))?;
        tracing::info!(account_id = %id, "account created");
        Ok(id)
    }

    /// Authenticate and start a session.
    ///
    /// On success the returned token carries the account's stored
    /// content key; the key is never re-derived from the password here.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Authentication` for an unknown email or a
    /// wrong password, without distinguishing the two.
    pub fn login(&self, email: &str, password: &str) -> Result<SessionToken> {
        let email = normalize_email(email).map_err(|_| VaultError::Authentication)?;

        // One debug event for both failure causes; the log must not
        // reveal whether the email or the password was wrong either.
        let Some(account) = self.store.account_by_email(&email)? else {
            tracing::debug!("login failed");
            return Err(VaultError::Authentication);
        };
        if !verify_password(password, &account.password_digest) {
            tracing::debug!("login failed");
            return Err(VaultError::Authentication);
        }

        let token = self
            .signer
            .issue(account.id, &account.derived_key, self.session_ttl_secs)?;
        tracing::debug!(account_id = %account.id, "session issued");
        Ok(token)
    }

    /// Verify a session token and return its claims.
    pub fn session_claims(&self, token: &SessionToken) -> Result<SessionClaims> {
        self.signer.verify(token)
    }

    /// Resolve a session token to its account record.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::AccountNotFound` if the session is valid but
    /// the account has vanished from storage.
    pub fn session_account(&self, token: &SessionToken) -> Result<Account> {
        let claims = self.signer.verify(token)?;
        self.store
            .account_by_id(&claims.account_id)?
            .ok_or(VaultError::AccountNotFound)
    }

    /// Create a note, encrypting its content under the session key.
    ///
    /// Empty content is allowed and stored as the empty ciphertext/IV
    /// pair.
    pub fn create_note(&self, token: &SessionToken, draft: &NoteDraft) -> Result<Note> {
        let claims = self.signer.verify(token)?;
        let key = claims.derived_key()?;
        let title = validate_title(&draft.title)?;

        let sealed = encrypt(&key, draft.content.as_bytes())?;
        let record = NewNoteRecord::new(claims.account_id, title, sealed)
            .with_tags(draft.tags.clone());
        let id = self.store.insert_note(&record)?;

        let stored = self
            .store
            .note(&id, &claims.account_id)?
            .ok_or(VaultError::NoteNotFound(id))?;
        tracing::debug!(note_id = %id, "note created");
        decrypt_record(&key, stored)
    }

    /// Read and decrypt a single note.
    ///
    /// # Errors
    ///
    /// - `VaultError::NoteNotFound` if the note does not exist for this
    ///   session's account
    /// - `VaultError::Decryption` if the stored payload cannot be read;
    ///   never empty content in disguise
    pub fn note(&self, token: &SessionToken, id: &Uuid) -> Result<Note> {
        let claims = self.signer.verify(token)?;
        let key = claims.derived_key()?;

        let record = self
            .store
            .note(id, &claims.account_id)?
            .ok_or(VaultError::NoteNotFound(*id))?;
        decrypt_record(&key, record)
    }

    /// List and decrypt all notes, most recently updated first.
    ///
    /// A single unreadable note fails the whole listing rather than
    /// being dropped or blanked.
    pub fn notes(&self, token: &SessionToken) -> Result<Vec<Note>> {
        let claims = self.signer.verify(token)?;
        let key = claims.derived_key()?;

        let records = self.store.list_notes(&claims.account_id)?;
        records
            .into_iter()
            .map(|record| decrypt_record(&key, record))
            .collect()
    }

    /// Apply partial changes to a note.
    ///
    /// Changed content is re-encrypted under a fresh IV; untouched
    /// fields keep their stored bytes.
    ///
    /// # Errors
    ///
    /// - `VaultError::InvalidInput` if no change is requested
    /// - `VaultError::NoteNotFound` if the note does not exist for this
    ///   session's account
    pub fn update_note(
        &self,
        token: &SessionToken,
        id: &Uuid,
        changes: &NoteChanges,
    ) -> Result<Note> {
        let claims = self.signer.verify(token)?;
        let key = claims.derived_key()?;

        if changes.is_empty() {
            return Err(VaultError::InvalidInput(
                "No changes requested".to_string(),
            ));
        }

        let mut update = NoteRecordUpdate::new();
        if let Some(title) = &changes.title {
            update = update.with_title(validate_title(title)?);
        }
        if let Some(content) = &changes.content {
            update = update.with_content(encrypt(&key, content.as_bytes())?);
        }
        if let Some(tags) = &changes.tags {
            update = update.with_tags(tags.clone());
        }

        let record = self
            .store
            .update_note(id, &claims.account_id, &update)?
            .ok_or(VaultError::NoteNotFound(*id))?;
        tracing::debug!(note_id = %id, "note updated");
        decrypt_record(&key, record)
    }

    /// Delete a note.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::NoteNotFound` if the note does not exist for
    /// this session's account.
    pub fn delete_note(&self, token: &SessionToken, id: &Uuid) -> Result<()> {
        let claims = self.signer.verify(token)?;

        if !self.store.delete_note(id, &claims.account_id)? {
            return Err(VaultError::NoteNotFound(*id));
        }
        tracing::debug!(note_id = %id, "note deleted");
        Ok(())
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return Err(VaultError::InvalidInput(
            "A valid email address is required".to_string(),
        ));
    }
    Ok(normalized)
}

fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(VaultError::InvalidInput("Title cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(VaultError::InvalidInput(format!(
            "Title too long (max {} characters)",
            MAX_TITLE_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

fn decrypt_record(key: &DerivedKey, record: NoteRecord) -> Result<Note> {
    let plaintext = decrypt(key, &record.sealed()).map_err(|err| {
        if let VaultError::Decryption { detail } = &err {
            tracing::warn!(note_id = %record.id, detail = %detail, "note decryption failed");
        }
        err
    })?;

    let content = String::from_utf8(plaintext).map_err(|_| {
        tracing::warn!(note_id = %record.id, "decrypted content is not valid UTF-8");
        VaultError::Decryption {
            detail: "decrypted content is not valid UTF-8".to_string(),
        }
    })?;

    Ok(Note {
        id: record.id,
        title: record.title,
        content,
        tags: record.tags,
        key_version: record.key_version,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}
