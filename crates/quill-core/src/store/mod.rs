//! Storage layer for the vault.
//!
//! Two narrow interfaces split the persistence concerns: [`CredentialStore`]
//! holds the deployment record and the single account, [`ContentStore`]
//! holds encrypted note records. [`SqliteStore`] implements both over one
//! SQLite file, and [`StoreCache`] keeps the open handle shared across
//! the process.
//!
//! Nothing in this module touches cryptography. Records go in and come
//! out exactly as the service layer sealed them.

mod cache;
mod sqlite;
mod traits;
mod types;

pub use cache::{acquire_store, reset_store_cache, StoreCache};
pub use sqlite::SqliteStore;
pub use traits::{ContentStore, CredentialStore};
pub use types::{Account, Deployment, NewAccount, NewNoteRecord, NoteRecord, NoteRecordUpdate};
