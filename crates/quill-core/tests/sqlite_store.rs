use std::thread;
use std::time::Duration;

use uuid::Uuid;

use quill_core::crypto::{derive_key, encrypt, DerivedKey};
use quill_core::store::{NewAccount, NewNoteRecord, NoteRecordUpdate};
use quill_core::{ContentStore, CredentialStore, SqliteStore, VaultError};

fn test_key() -> DerivedKey {
    derive_key("store-test-password", b"store-test-salt!").unwrap()
}

fn seed_account(store: &SqliteStore) -> Uuid {
    let key = test_key();
    store
        .insert_account(&NewAccount::new(
            "owner@example.com",
            "0".repeat(64),
            b"store-test-salt!".to_vec(),
            key,
        ))
        .expect("account insert should succeed")
}

fn seed_note(store: &SqliteStore, owner: Uuid, title: &str, content: &str) -> Uuid {
    let sealed = encrypt(&test_key(), content.as_bytes()).unwrap();
    store
        .insert_note(&NewNoteRecord::new(owner, title, sealed))
        .expect("note insert should succeed")
}

// Microsecond timestamps need a nudge to guarantee distinct ordering.
fn tick() {
    thread::sleep(Duration::from_millis(2));
}

#[test]
fn test_open_creates_deployment_record() {
    let store = SqliteStore::open_in_memory().expect("open should succeed");

    let deployment = store.deployment().expect("deployment should exist");
    assert!(!deployment.id.is_nil());
    assert_eq!(deployment.format_version, "1");
    assert_eq!(deployment.session_secret.len(), 32);
}

#[test]
fn test_deployment_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");

    let first = {
        let store = SqliteStore::open(&path).expect("open should succeed");
        store.deployment().expect("deployment should exist")
    };

    let store = SqliteStore::open(&path).expect("reopen should succeed");
    let second = store.deployment().expect("deployment should exist");

    assert_eq!(first.id, second.id);
    assert_eq!(first.session_secret, second.session_secret);
    assert_eq!(first.created_at, second.created_at);
}

#[test]
fn test_insert_and_fetch_account() {
    let store = SqliteStore::open_in_memory().unwrap();
    let key = test_key();

    let id = store
        .insert_account(&NewAccount::new(
            "user@example.com",
            "abc123".repeat(10),
            b"0123456789abcdef".to_vec(),
            key.clone(),
        ))
        .expect("insert should succeed");

    assert_eq!(store.account_count().unwrap(), 1);

    let by_email = store
        .account_by_email("user@example.com")
        .unwrap()
        .expect("account should be found by email");
    assert_eq!(by_email.id, id);
    assert_eq!(by_email.password_digest, "abc123".repeat(10));
    assert_eq!(by_email.kdf_salt, b"0123456789abcdef");
    assert_eq!(by_email.derived_key.as_bytes(), key.as_bytes());

    let by_id = store
        .account_by_id(&id)
        .unwrap()
        .expect("account should be found by id");
    assert_eq!(by_id.email, "user@example.com");
}

#[test]
fn test_second_account_refused() {
    let store = SqliteStore::open_in_memory().unwrap();
    seed_account(&store);

    let result = store.insert_account(&NewAccount::new(
        "second@example.com",
        "1".repeat(64),
        b"another-salt-16b".to_vec(),
        test_key(),
    ));
    assert!(matches!(result, Err(VaultError::AccountExists)));
    assert_eq!(store.account_count().unwrap(), 1);
}

#[test]
fn test_missing_account_is_none() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert!(store.account_by_email("nobody@example.com").unwrap().is_none());
    assert!(store.account_by_id(&Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn test_insert_and_fetch_note() {
    let store = SqliteStore::open_in_memory().unwrap();
    let owner = seed_account(&store);

    let sealed = encrypt(&test_key(), b"note body").unwrap();
    let id = store
        .insert_note(&NewNoteRecord::new(owner, "a title", sealed.clone()))
        .unwrap();

    let record = store
        .note(&id, &owner)
        .unwrap()
        .expect("note should be found for its owner");
    assert_eq!(record.title, "a title");
    assert_eq!(record.ciphertext, sealed.ciphertext);
    assert_eq!(record.iv, sealed.iv);
    assert_eq!(record.key_version, 1);
    assert_eq!(record.created_at, record.updated_at);
}

#[test]
fn test_note_is_scoped_to_owner() {
    let store = SqliteStore::open_in_memory().unwrap();
    let owner = seed_account(&store);
    let id = seed_note(&store, owner, "mine", "content");

    let stranger = Uuid::new_v4();
    assert!(store.note(&id, &stranger).unwrap().is_none());
    assert!(store.list_notes(&stranger).unwrap().is_empty());
    assert!(!store.delete_note(&id, &stranger).unwrap());

    let update = NoteRecordUpdate::new().with_title("stolen");
    assert!(store.update_note(&id, &stranger, &update).unwrap().is_none());

    // Still intact for the real owner
    let record = store.note(&id, &owner).unwrap().unwrap();
    assert_eq!(record.title, "mine");
}

#[test]
fn test_list_notes_newest_updated_first() {
    let store = SqliteStore::open_in_memory().unwrap();
    let owner = seed_account(&store);

    let first = seed_note(&store, owner, "first", "1");
    tick();
    let second = seed_note(&store, owner, "second", "2");
    tick();
    let third = seed_note(&store, owner, "third", "3");

    let listed: Vec<Uuid> = store
        .list_notes(&owner)
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(listed, vec![third, second, first]);

    // Updating the oldest note moves it to the front
    tick();
    let update = NoteRecordUpdate::new().with_title("first, renamed");
    store.update_note(&first, &owner, &update).unwrap().unwrap();

    let listed: Vec<Uuid> = store
        .list_notes(&owner)
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(listed, vec![first, third, second]);
}

#[test]
fn test_update_note_replaces_payload() {
    let store = SqliteStore::open_in_memory().unwrap();
    let owner = seed_account(&store);
    let id = seed_note(&store, owner, "stable title", "original");
    let before = store.note(&id, &owner).unwrap().unwrap();

    tick();
    let resealed = encrypt(&test_key(), b"replaced").unwrap();
    let update = NoteRecordUpdate::new().with_content(resealed.clone());
    let after = store
        .update_note(&id, &owner, &update)
        .unwrap()
        .expect("update should find the note");

    assert_eq!(after.title, "stable title");
    assert_eq!(after.ciphertext, resealed.ciphertext);
    assert_eq!(after.iv, resealed.iv);
    assert_ne!(after.iv, before.iv);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);

    // The returned record matches what a fresh read sees
    let reread = store.note(&id, &owner).unwrap().unwrap();
    assert_eq!(reread.ciphertext, after.ciphertext);
    assert_eq!(reread.updated_at, after.updated_at);
}

#[test]
fn test_update_missing_note_returns_none() {
    let store = SqliteStore::open_in_memory().unwrap();
    let owner = seed_account(&store);

    let update = NoteRecordUpdate::new().with_title("ghost");
    assert!(store
        .update_note(&Uuid::new_v4(), &owner, &update)
        .unwrap()
        .is_none());
}

#[test]
fn test_tags_normalized_on_write() {
    let store = SqliteStore::open_in_memory().unwrap();
    let owner = seed_account(&store);

    let sealed = encrypt(&test_key(), b"tagged").unwrap();
    let record = NewNoteRecord::new(owner, "tagged", sealed).with_tags(vec![
        " Work ".to_string(),
        "work".to_string(),
        "HOME".to_string(),
    ]);
    let id = store.insert_note(&record).unwrap();

    let stored = store.note(&id, &owner).unwrap().unwrap();
    assert_eq!(stored.tags, vec!["work".to_string(), "home".to_string()]);
}

#[test]
fn test_empty_tag_rejected() {
    let store = SqliteStore::open_in_memory().unwrap();
    let owner = seed_account(&store);

    let sealed = encrypt(&test_key(), b"x").unwrap();
    let record = NewNoteRecord::new(owner, "t", sealed).with_tags(vec!["  ".to_string()]);
    assert!(matches!(
        store.insert_note(&record),
        Err(VaultError::InvalidInput(_))
    ));
}

#[test]
fn test_delete_note() {
    let store = SqliteStore::open_in_memory().unwrap();
    let owner = seed_account(&store);
    let id = seed_note(&store, owner, "doomed", "content");

    assert!(store.delete_note(&id, &owner).unwrap());
    assert!(store.note(&id, &owner).unwrap().is_none());
    assert!(!store.delete_note(&id, &owner).unwrap());
}

#[test]
fn test_empty_content_stores_empty_pair() {
    let store = SqliteStore::open_in_memory().unwrap();
    let owner = seed_account(&store);

    let sealed = encrypt(&test_key(), b"").unwrap();
    let id = store
        .insert_note(&NewNoteRecord::new(owner, "empty", sealed))
        .unwrap();

    let record = store.note(&id, &owner).unwrap().unwrap();
    assert!(record.ciphertext.is_empty());
    assert!(record.iv.is_empty());
}
