//! SQLite storage backend.
//!
//! One database file holds the whole vault: a `meta` key/value table
//! with the deployment record, the single `accounts` row and the
//! encrypted `notes`. Opening the file creates the schema and writes
//! the deployment record on first use, so callers never see a vault
//! without one.
//!
//! Column encodings: UUIDs and timestamps are TEXT (RFC 3339 with
//! fixed-width microseconds so lexicographic order is chronological),
//! salts, keys and IVs are hex, ciphertext is base64.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::crypto::cipher::Sealed;
use crate::crypto::kdf::DerivedKey;
use crate::error::{Result, VaultError};
use crate::session::SESSION_SECRET_LENGTH;
use crate::store::traits::{ContentStore, CredentialStore};
use crate::store::types::{
    Account, Deployment, NewAccount, NewNoteRecord, NoteRecord, NoteRecordUpdate,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_digest TEXT NOT NULL,
    kdf_salt TEXT NOT NULL,
    derived_key TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    title TEXT NOT NULL,
    ciphertext TEXT NOT NULL,
    iv TEXT NOT NULL,
    key_version INTEGER NOT NULL DEFAULT 1,
    tags_json TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    FOREIGN KEY(owner_id) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_notes_owner_updated
    ON notes(owner_id, updated_at DESC);
"#;

/// SQLite-backed implementation of both storage interfaces.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    const MAX_TAG_BYTES: usize = 128;
    const MAX_TAGS_PER_NOTE: usize = 100;

    /// Open (or create) a vault database at the given path.
    ///
    /// First use creates the schema and the deployment record,
    /// including a fresh session signing secret.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Sqlite` if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: &Path) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        Self::initialize(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a fresh in-memory vault. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        Self::initialize(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &mut Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        let meta_rows: i64 = conn.query_row("SELECT COUNT(*) FROM meta", [], |row| row.get(0))?;
        if meta_rows == 0 {
            let mut secret = [0u8; SESSION_SECRET_LENGTH];
            getrandom::getrandom(&mut secret).map_err(|e| {
                VaultError::Storage(format!("Failed to generate session secret: {}", e))
            })?;

            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?, ?)",
                ["format_version", "1"],
            )?;
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?, ?)",
                ["deployment_id", &Uuid::new_v4().to_string()],
            )?;
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?, ?)",
                ["session_secret", &hex::encode(secret)],
            )?;
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?, ?)",
                ["created_at", &Self::now_str()],
            )?;
            tx.commit()?;
        }

        Ok(())
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VaultError::Storage("SQLite connection poisoned".to_string()))
    }

    // Micros keeps the encoded width fixed so TEXT order stays chronological.
    fn now_str() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn meta_value(conn: &Connection, key: &str) -> Result<String> {
        let value = conn
            .query_row("SELECT value FROM meta WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        value.ok_or_else(|| VaultError::Storage(format!("Metadata key missing: {}", key)))
    }

    fn parse_uuid(value: &str) -> Result<Uuid> {
        Uuid::parse_str(value).map_err(|e| VaultError::Storage(format!("Invalid UUID: {}", e)))
    }

    fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| VaultError::Storage(format!("Invalid timestamp: {}", e)))
    }

    fn normalize_tags(tags: &[String]) -> Result<Vec<String>> {
        if tags.len() > Self::MAX_TAGS_PER_NOTE {
            return Err(VaultError::InvalidInput(format!(
                "Too many tags (max {})",
                Self::MAX_TAGS_PER_NOTE
            )));
        }

        let mut normalized = Vec::new();
        for tag in tags {
            let trimmed = tag.trim().to_lowercase();
            if trimmed.is_empty() {
                return Err(VaultError::InvalidInput(
                    "Empty tag is not allowed".to_string(),
                ));
            }
            if trimmed.len() > Self::MAX_TAG_BYTES {
                return Err(VaultError::InvalidInput(format!(
                    "Tag too long (max {} bytes)",
                    Self::MAX_TAG_BYTES
                )));
            }
            if !normalized.contains(&trimmed) {
                normalized.push(trimmed);
            }
        }

        Ok(normalized)
    }

    fn tags_to_json(tags: &[String]) -> Result<Option<String>> {
        if tags.is_empty() {
            Ok(None)
        } else {
            Ok(Some(serde_json::to_string(tags)?))
        }
    }

    fn account_from_row(
        id_str: String,
        email: String,
        password_digest: String,
        kdf_salt_hex: String,
        derived_key_hex: String,
        created_at_str: String,
    ) -> Result<Account> {
        let id = Self::parse_uuid(&id_str)?;
        let kdf_salt = hex::decode(&kdf_salt_hex)
            .map_err(|e| VaultError::Storage(format!("Invalid salt encoding: {}", e)))?;
        let derived_key = DerivedKey::from_hex(&derived_key_hex)
            .map_err(|_| VaultError::Storage("Invalid stored key".to_string()))?;
        let created_at = Self::parse_timestamp(&created_at_str)?;

        Ok(Account {
            id,
            email,
            password_digest,
            kdf_salt,
            derived_key,
            created_at,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn note_from_row(
        id_str: String,
        owner_id_str: String,
        title: String,
        ciphertext_b64: String,
        iv_hex: String,
        key_version: i32,
        tags_json_str: Option<String>,
        created_at_str: String,
        updated_at_str: String,
    ) -> Result<NoteRecord> {
        let id = Self::parse_uuid(&id_str)?;
        let owner_id = Self::parse_uuid(&owner_id_str)?;
        let ciphertext = BASE64
            .decode(&ciphertext_b64)
            .map_err(|e| VaultError::Storage(format!("Invalid ciphertext encoding: {}", e)))?;
        let iv = hex::decode(&iv_hex)
            .map_err(|e| VaultError::Storage(format!("Invalid IV encoding: {}", e)))?;
        let tags: Vec<String> = match tags_json_str {
            Some(value) => serde_json::from_str(&value)
                .map_err(|e| VaultError::Storage(format!("Invalid tags JSON: {}", e)))?,
            None => Vec::new(),
        };
        let created_at = Self::parse_timestamp(&created_at_str)?;
        let updated_at = Self::parse_timestamp(&updated_at_str)?;

        Ok(NoteRecord {
            id,
            owner_id,
            title,
            ciphertext,
            iv,
            key_version,
            tags,
            created_at,
            updated_at,
        })
    }
}

impl CredentialStore for SqliteStore {
    fn deployment(&self) -> Result<Deployment> {
        let conn = self.lock_conn()?;

        let id = Self::parse_uuid(&Self::meta_value(&conn, "deployment_id")?)?;
        let format_version = Self::meta_value(&conn, "format_version")?;
        let session_secret = hex::decode(Self::meta_value(&conn, "session_secret")?)
            .map_err(|e| VaultError::Storage(format!("Invalid session secret: {}", e)))?;
        let created_at = Self::parse_timestamp(&Self::meta_value(&conn, "created_at")?)?;

        Ok(Deployment {
            id,
            format_version,
            session_secret,
            created_at,
        })
    }

    fn account_count(&self) -> Result<u64> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn insert_account(&self, account: &NewAccount) -> Result<Uuid> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        if count > 0 {
            return Err(VaultError::AccountExists);
        }

        let id = Uuid::new_v4();
        tx.execute(
            r#"
            INSERT INTO accounts (id, email, password_digest, kdf_salt, derived_key, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            (
                id.to_string(),
                &account.email,
                &account.password_digest,
                hex::encode(&account.kdf_salt),
                account.derived_key.to_hex(),
                Self::now_str(),
            ),
        )?;

        tx.commit()?;
        Ok(id)
    }

    fn account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.lock_conn()?;

        let result = conn.query_row(
            r#"
            SELECT id, email, password_digest, kdf_salt, derived_key, created_at
            FROM accounts
            WHERE email = ?
            "#,
            [email],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        );

        match result {
            Ok((id, email, digest, salt, key, created_at)) => Ok(Some(Self::account_from_row(
                id, email, digest, salt, key, created_at,
            )?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn account_by_id(&self, id: &Uuid) -> Result<Option<Account>> {
        let conn = self.lock_conn()?;

        let result = conn.query_row(
            r#"
            SELECT id, email, password_digest, kdf_salt, derived_key, created_at
            FROM accounts
            WHERE id = ?
            "#,
            [id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        );

        match result {
            Ok((id, email, digest, salt, key, created_at)) => Ok(Some(Self::account_from_row(
                id, email, digest, salt, key, created_at,
            )?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ContentStore for SqliteStore {
    fn insert_note(&self, note: &NewNoteRecord) -> Result<Uuid> {
        let normalized_tags = Self::normalize_tags(&note.tags)?;
        let tags_json = Self::tags_to_json(&normalized_tags)?;

        let conn = self.lock_conn()?;
        let id = Uuid::new_v4();
        let now = Self::now_str();

        conn.execute(
            r#"
            INSERT INTO notes (
                id, owner_id, title, ciphertext, iv, key_version, tags_json, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            (
                id.to_string(),
                note.owner_id.to_string(),
                &note.title,
                BASE64.encode(&note.content.ciphertext),
                hex::encode(&note.content.iv),
                note.key_version,
                tags_json,
                now.clone(),
                now,
            ),
        )?;

        Ok(id)
    }

    fn note(&self, id: &Uuid, owner_id: &Uuid) -> Result<Option<NoteRecord>> {
        let conn = self.lock_conn()?;

        let result = conn.query_row(
            r#"
            SELECT id, owner_id, title, ciphertext, iv, key_version, tags_json, created_at, updated_at
            FROM notes
            WHERE id = ? AND owner_id = ?
            "#,
            [id.to_string(), owner_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i32>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                ))
            },
        );

        match result {
            Ok((id, owner, title, ciphertext, iv, key_version, tags, created_at, updated_at)) => {
                Ok(Some(Self::note_from_row(
                    id, owner, title, ciphertext, iv, key_version, tags, created_at, updated_at,
                )?))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_notes(&self, owner_id: &Uuid) -> Result<Vec<NoteRecord>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, owner_id, title, ciphertext, iv, key_version, tags_json, created_at, updated_at
            FROM notes
            WHERE owner_id = ?
            ORDER BY updated_at DESC, created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([owner_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i32>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut notes = Vec::new();
        for row in rows {
            let (id, owner, title, ciphertext, iv, key_version, tags, created_at, updated_at) =
                row?;
            notes.push(Self::note_from_row(
                id, owner, title, ciphertext, iv, key_version, tags, created_at, updated_at,
            )?);
        }

        Ok(notes)
    }

    fn update_note(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
        update: &NoteRecordUpdate,
    ) -> Result<Option<NoteRecord>> {
        let normalized_tags = match &update.tags {
            Some(tags) => Some(Self::normalize_tags(tags)?),
            None => None,
        };

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                r#"
                SELECT title, ciphertext, iv, key_version, tags_json, created_at
                FROM notes
                WHERE id = ? AND owner_id = ?
                "#,
                [id.to_string(), owner_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i32>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((title, ciphertext_b64, iv_hex, key_version, tags_json, created_at_str)) =
            existing
        else {
            return Ok(None);
        };

        let new_title = update.title.clone().unwrap_or(title);
        let (new_ciphertext_b64, new_iv_hex) = match &update.content {
            Some(sealed) => (BASE64.encode(&sealed.ciphertext), hex::encode(&sealed.iv)),
            None => (ciphertext_b64, iv_hex),
        };
        let new_tags_json = match normalized_tags {
            Some(tags) => Self::tags_to_json(&tags)?,
            None => tags_json,
        };
        let updated_at = Self::now_str();

        tx.execute(
            r#"
            UPDATE notes
            SET title = ?, ciphertext = ?, iv = ?, tags_json = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
            (
                &new_title,
                &new_ciphertext_b64,
                &new_iv_hex,
                &new_tags_json,
                &updated_at,
                id.to_string(),
                owner_id.to_string(),
            ),
        )?;

        tx.commit()?;

        Self::note_from_row(
            id.to_string(),
            owner_id.to_string(),
            new_title,
            new_ciphertext_b64,
            new_iv_hex,
            key_version,
            new_tags_json,
            created_at_str,
            updated_at,
        )
        .map(Some)
    }

    fn delete_note(&self, id: &Uuid, owner_id: &Uuid) -> Result<bool> {
        let conn = self.lock_conn()?;
        let deleted = conn.execute(
            "DELETE FROM notes WHERE id = ? AND owner_id = ?",
            [id.to_string(), owner_id.to_string()],
        )?;
        Ok(deleted > 0)
    }
}

impl SqliteStore {
    /// The encrypted payload for a note, without owner scoping.
    ///
    /// Test support: lets integration tests inspect and corrupt stored
    /// ciphertext directly.
    #[doc(hidden)]
    pub fn raw_note_payload(&self, id: &Uuid) -> Result<Option<Sealed>> {
        let conn = self.lock_conn()?;

        let result = conn.query_row(
            "SELECT ciphertext, iv FROM notes WHERE id = ?",
            [id.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        );

        match result {
            Ok((ciphertext_b64, iv_hex)) => {
                let ciphertext = BASE64.decode(&ciphertext_b64).map_err(|e| {
                    VaultError::Storage(format!("Invalid ciphertext encoding: {}", e))
                })?;
                let iv = hex::decode(&iv_hex)
                    .map_err(|e| VaultError::Storage(format!("Invalid IV encoding: {}", e)))?;
                Ok(Some(Sealed::new(ciphertext, iv)))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the stored payload for a note, without owner scoping.
    ///
    /// Test support: simulates on-disk tampering.
    #[doc(hidden)]
    pub fn overwrite_note_payload(&self, id: &Uuid, sealed: &Sealed) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE notes SET ciphertext = ?, iv = ? WHERE id = ?",
            (
                BASE64.encode(&sealed.ciphertext),
                hex::encode(&sealed.iv),
                id.to_string(),
            ),
        )?;
        Ok(())
    }
}
