//! Storage trait definitions.
//!
//! Persistence is split into two interfaces so the service layer can
//! name exactly what it needs: `CredentialStore` for the deployment
//! record and account, `ContentStore` for encrypted note records.
//! `SqliteStore` implements both; tests can substitute either one
//! independently.

use std::sync::Arc;

use uuid::Uuid;

use super::types::{Account, Deployment, NewAccount, NewNoteRecord, NoteRecord, NoteRecordUpdate};
use crate::error::Result;

/// Storage interface for the deployment record and account credentials.
///
/// All implementations must ensure:
/// - The deployment record exists before any other call (bootstrap on open)
/// - At most one account is ever stored
/// - Lookups by email match exactly (no normalization at this layer)
pub trait CredentialStore: Send + Sync {
    /// Get the deployment record for this vault.
    fn deployment(&self) -> Result<Deployment>;

    /// Count stored accounts.
    ///
    /// The service layer uses this to refuse a second setup.
    fn account_count(&self) -> Result<u64>;

    /// Insert the account created at setup.
    ///
    /// # Returns
    ///
    /// Returns the UUID of the created account.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::AccountExists` if an account is already stored.
    fn insert_account(&self, account: &NewAccount) -> Result<Uuid>;

    /// Look up the account by email.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(account))` if found, `Ok(None)` if not found.
    fn account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Look up the account by ID.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(account))` if found, `Ok(None)` if not found.
    fn account_by_id(&self, id: &Uuid) -> Result<Option<Account>>;
}

/// Storage interface for encrypted note records.
///
/// Every read and write is scoped to an owner. A note that exists but
/// belongs to a different account behaves exactly like a note that does
/// not exist.
pub trait ContentStore: Send + Sync {
    /// Insert a new note record.
    ///
    /// # Returns
    ///
    /// Returns the UUID of the created note.
    fn insert_note(&self, note: &NewNoteRecord) -> Result<Uuid>;

    /// Get a note by ID, scoped to its owner.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(record))` if the note exists and belongs to
    /// `owner_id`, `Ok(None)` otherwise.
    fn note(&self, id: &Uuid, owner_id: &Uuid) -> Result<Option<NoteRecord>>;

    /// List all notes belonging to an owner.
    ///
    /// Records are returned most recently updated first.
    fn list_notes(&self, owner_id: &Uuid) -> Result<Vec<NoteRecord>>;

    /// Apply a partial update to a note, scoped to its owner.
    ///
    /// Bumps `updated_at` when any field changes.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(record))` with the updated record, or `Ok(None)`
    /// if the note does not exist for this owner.
    fn update_note(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
        update: &NoteRecordUpdate,
    ) -> Result<Option<NoteRecord>>;

    /// Delete a note, scoped to its owner.
    ///
    /// # Returns
    ///
    /// Returns `true` if a record was deleted, `false` if nothing matched.
    fn delete_note(&self, id: &Uuid, owner_id: &Uuid) -> Result<bool>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    fn deployment(&self) -> Result<Deployment> {
        (**self).deployment()
    }

    fn account_count(&self) -> Result<u64> {
        (**self).account_count()
    }

    fn insert_account(&self, account: &NewAccount) -> Result<Uuid> {
        (**self).insert_account(account)
    }

    fn account_by_email(&self, email: &str) -> Result<Option<Account>> {
        (**self).account_by_email(email)
    }

    fn account_by_id(&self, id: &Uuid) -> Result<Option<Account>> {
        (**self).account_by_id(id)
    }
}

impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    fn insert_note(&self, note: &NewNoteRecord) -> Result<Uuid> {
        (**self).insert_note(note)
    }

    fn note(&self, id: &Uuid, owner_id: &Uuid) -> Result<Option<NoteRecord>> {
        (**self).note(id, owner_id)
    }

    fn list_notes(&self, owner_id: &Uuid) -> Result<Vec<NoteRecord>> {
        (**self).list_notes(owner_id)
    }

    fn update_note(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
        update: &NoteRecordUpdate,
    ) -> Result<Option<NoteRecord>> {
        (**self).update_note(id, owner_id, update)
    }

    fn delete_note(&self, id: &Uuid, owner_id: &Uuid) -> Result<bool> {
        (**self).delete_note(id, owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests verify the trait contracts exist
    // Actual implementations are tested in their own modules

    #[test]
    fn test_trait_definitions_compile() {
        fn _accepts_credential_store<T: CredentialStore>(_store: T) {}
        fn _accepts_content_store<T: ContentStore>(_store: T) {}
        fn _accepts_both<T: CredentialStore + ContentStore>(_store: T) {}
    }
}
