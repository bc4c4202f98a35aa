//! Core data types for the storage layer.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::crypto::cipher::Sealed;
use crate::crypto::kdf::DerivedKey;

/// Metadata for a vault deployment.
///
/// Written once when the database file is first created.
#[derive(Clone)]
pub struct Deployment {
    /// Unique identifier for this deployment
    pub id: Uuid,

    /// Storage format version (currently "1")
    pub format_version: String,

    /// Secret used to sign session tokens
    pub session_secret: Vec<u8>,

    /// When this vault was created
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployment")
            .field("id", &self.id)
            .field("format_version", &self.format_version)
            .field("session_secret", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// The single account a vault holds.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique identifier for this account
    pub id: Uuid,

    /// Login email address
    pub email: String,

    /// Hex SHA-256 digest of the account password
    pub password_digest: String,

    /// Salt used to derive the content key from the password
    pub kdf_salt: Vec<u8>,

    /// The content encryption key (derived once at setup)
    pub derived_key: DerivedKey,

    /// When this account was created
    pub created_at: DateTime<Utc>,
}

/// Builder for creating the account at setup time.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Login email address
    pub email: String,

    /// Hex SHA-256 digest of the account password
    pub password_digest: String,

    /// Salt used for key derivation
    pub kdf_salt: Vec<u8>,

    /// The derived content encryption key
    pub derived_key: DerivedKey,
}

impl NewAccount {
    pub fn new(
        email: impl Into<String>,
        password_digest: impl Into<String>,
        kdf_salt: Vec<u8>,
        derived_key: DerivedKey,
    ) -> Self {
        Self {
            email: email.into(),
            password_digest: password_digest.into(),
            kdf_salt,
            derived_key,
        }
    }
}

/// A stored note: cleartext title, encrypted content.
#[derive(Debug, Clone)]
pub struct NoteRecord {
    /// Unique identifier for this note
    pub id: Uuid,

    /// Account that owns this note
    pub owner_id: Uuid,

    /// Note title (stored in the clear)
    pub title: String,

    /// Encrypted note content
    pub ciphertext: Vec<u8>,

    /// IV the content was sealed under
    pub iv: Vec<u8>,

    /// Key version the content was sealed with (currently always 1)
    pub key_version: i32,

    /// Tags associated with this note
    pub tags: Vec<String>,

    /// When this note was created
    pub created_at: DateTime<Utc>,

    /// When this note was last modified
    pub updated_at: DateTime<Utc>,
}

impl NoteRecord {
    /// The ciphertext and IV as a [`Sealed`] pair ready for decryption.
    pub fn sealed(&self) -> Sealed {
        Sealed::new(self.ciphertext.clone(), self.iv.clone())
    }
}

/// Builder for creating new note records.
#[derive(Debug, Clone)]
pub struct NewNoteRecord {
    /// Account that will own this note
    pub owner_id: Uuid,

    /// Note title
    pub title: String,

    /// Encrypted content
    pub content: Sealed,

    /// Key version the content was sealed with
    pub key_version: i32,

    /// Tags
    pub tags: Vec<String>,
}

impl NewNoteRecord {
    pub fn new(owner_id: Uuid, title: impl Into<String>, content: Sealed) -> Self {
        Self {
            owner_id,
            title: title.into(),
            content,
            key_version: 1,
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Partial update for an existing note record.
///
/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct NoteRecordUpdate {
    /// Replacement title
    pub title: Option<String>,

    /// Replacement encrypted content (sealed under a fresh IV)
    pub content: Option<Sealed>,

    /// Replacement tag set
    pub tags: Option<Vec<String>>,
}

impl NoteRecordUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: Sealed) -> Self {
        self.content = Some(content);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_note_record_builder() {
        let owner = Uuid::new_v4();
        let sealed = Sealed::new(vec![1, 2, 3], vec![0; 16]);

        let record = NewNoteRecord::new(owner, "groceries", sealed.clone())
            .with_tags(vec!["errands".to_string()]);

        assert_eq!(record.owner_id, owner);
        assert_eq!(record.title, "groceries");
        assert_eq!(record.content, sealed);
        assert_eq!(record.key_version, 1);
        assert_eq!(record.tags.len(), 1);
    }

    #[test]
    fn test_note_record_update_builder() {
        let update = NoteRecordUpdate::new();
        assert!(update.is_empty());

        let sealed = Sealed::new(vec![9], vec![0; 16]);
        let update = NoteRecordUpdate::new()
            .with_title("renamed")
            .with_content(sealed.clone())
            .with_tags(vec![]);

        assert!(!update.is_empty());
        assert_eq!(update.title.as_deref(), Some("renamed"));
        assert_eq!(update.content, Some(sealed));
        assert_eq!(update.tags, Some(vec![]));
    }

    #[test]
    fn test_deployment_debug_redacts_secret() {
        let deployment = Deployment {
            id: Uuid::new_v4(),
            format_version: "1".to_string(),
            session_secret: vec![0xAB; 32],
            created_at: Utc::now(),
        };

        let debug_output = format!("{:?}", deployment);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("171, 171"));
    }
}
