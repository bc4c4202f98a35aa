use std::sync::Arc;

use secrecy::SecretString;

use quill_core::crypto::derive_key;
use quill_core::{
    hash_password, NoteChanges, NoteDraft, SqliteStore, Vault, VaultError, VaultOptions,
};

const PASSWORD: &str = "Tr0ub4dor&3";
const EMAIL: &str = "owner@example.com";
const SETUP_TOKEN: &str = "pre-shared-setup-token";

fn open_vault() -> (Arc<SqliteStore>, Vault<Arc<SqliteStore>>) {
    let store = Arc::new(SqliteStore::open_in_memory().expect("open should succeed"));
    let options =
        VaultOptions::new().with_setup_token(SecretString::from(SETUP_TOKEN.to_string()));
    let vault = Vault::new(Arc::clone(&store), options).expect("vault should build");
    (store, vault)
}

fn setup_and_login(vault: &Vault<Arc<SqliteStore>>) -> quill_core::SessionToken {
    vault
        .setup(SETUP_TOKEN, EMAIL, PASSWORD)
        .expect("setup should succeed");
    vault.login(EMAIL, PASSWORD).expect("login should succeed")
}

#[test]
fn test_full_account_and_note_flow() {
    let (store, vault) = open_vault();

    // Setup persists a digest and an independently derived key
    let account_id = vault
        .setup(SETUP_TOKEN, EMAIL, PASSWORD)
        .expect("setup should succeed");

    use quill_core::CredentialStore;
    let account = store
        .account_by_email(EMAIL)
        .unwrap()
        .expect("account should be stored");
    assert_eq!(account.id, account_id);
    assert_eq!(account.password_digest, hash_password(PASSWORD));
    assert_eq!(account.kdf_salt.len(), 16);

    let recomputed = derive_key(PASSWORD, &account.kdf_salt).unwrap();
    assert_eq!(account.derived_key.as_bytes(), recomputed.as_bytes());

    // Login hands back the stored key, not a fresh derivation path
    let token = vault.login(EMAIL, PASSWORD).expect("login should succeed");
    let claims = vault.session_claims(&token).unwrap();
    assert_eq!(claims.account_id, account_id);
    assert_eq!(
        claims.derived_key().unwrap().as_bytes(),
        account.derived_key.as_bytes()
    );

    // Content is encrypted at rest
    let note = vault
        .create_note(&token, &NoteDraft::new("a", "secret text"))
        .expect("create should succeed");
    assert_eq!(note.content, "secret text");

    let stored = store
        .raw_note_payload(&note.id)
        .unwrap()
        .expect("payload should be stored");
    assert_eq!(stored.iv.len(), 16);
    assert!(!stored.ciphertext.is_empty());
    assert_ne!(stored.ciphertext.as_slice(), b"secret text");

    // And decrypts back on read
    let read_back = vault.note(&token, &note.id).expect("read should succeed");
    assert_eq!(read_back.title, "a");
    assert_eq!(read_back.content, "secret text");
}

#[test]
fn test_wrong_setup_token_refused() {
    let (_store, vault) = open_vault();
    let result = vault.setup("not-the-token", EMAIL, PASSWORD);
    assert!(matches!(result, Err(VaultError::Authentication)));
}

#[test]
fn test_wrong_password_refused() {
    let (_store, vault) = open_vault();
    vault.setup(SETUP_TOKEN, EMAIL, PASSWORD).unwrap();

    let result = vault.login(EMAIL, "Tr0ub4dor&4");
    assert!(matches!(result, Err(VaultError::Authentication)));
}

#[test]
fn test_expired_session_refused() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let options = VaultOptions::new()
        .with_setup_token(SecretString::from(SETUP_TOKEN.to_string()))
        .with_session_ttl(0);
    let vault = Vault::new(Arc::clone(&store), options).unwrap();

    vault.setup(SETUP_TOKEN, EMAIL, PASSWORD).unwrap();
    let token = vault.login(EMAIL, PASSWORD).unwrap();

    assert!(matches!(
        vault.notes(&token),
        Err(VaultError::SessionExpired)
    ));
}

#[test]
fn test_sessions_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let options =
        || VaultOptions::new().with_setup_token(SecretString::from(SETUP_TOKEN.to_string()));

    let token = {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let vault = Vault::new(store, options()).unwrap();
        vault.setup(SETUP_TOKEN, EMAIL, PASSWORD).unwrap();
        vault.login(EMAIL, PASSWORD).unwrap()
    };

    // A new process opening the same vault trusts the old token
    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let vault = Vault::new(store, options()).unwrap();
    let account = vault.session_account(&token).expect("token should verify");
    assert_eq!(account.email, EMAIL);
}

#[test]
fn test_update_reencrypts_under_fresh_iv() {
    let (store, vault) = open_vault();
    let token = setup_and_login(&vault);

    let note = vault
        .create_note(&token, &NoteDraft::new("rotating", "before"))
        .unwrap();
    let before = store.raw_note_payload(&note.id).unwrap().unwrap();

    let changes = NoteChanges::new().with_content("after");
    let updated = vault.update_note(&token, &note.id, &changes).unwrap();
    assert_eq!(updated.content, "after");

    let after = store.raw_note_payload(&note.id).unwrap().unwrap();
    assert_ne!(after.iv, before.iv);
    assert_ne!(after.ciphertext, before.ciphertext);
}

#[test]
fn test_tampered_ciphertext_never_reads_clean() {
    let (store, vault) = open_vault();
    let token = setup_and_login(&vault);

    let content = "a note long enough to span multiple cipher blocks of storage";
    let note = vault
        .create_note(&token, &NoteDraft::new("tampered", content))
        .unwrap();

    // Flip one byte in the leading block: without an integrity tag this
    // decrypts "successfully" into corrupted plaintext.
    let mut sealed = store.raw_note_payload(&note.id).unwrap().unwrap();
    sealed.ciphertext[0] ^= 0x01;
    store.overwrite_note_payload(&note.id, &sealed).unwrap();

    match vault.note(&token, &note.id) {
        Ok(read) => assert_ne!(read.content, content),
        Err(VaultError::Decryption { .. }) => {}
        Err(other) => panic!("unexpected error: {other:?}"),
    }

    // Flip a byte in the final block instead: the padding check makes
    // this surface as a decryption error almost always.
    let mut sealed = store.raw_note_payload(&note.id).unwrap().unwrap();
    sealed.ciphertext[0] ^= 0x01; // restore the leading block
    let last = sealed.ciphertext.len() - 1;
    sealed.ciphertext[last] ^= 0x01;
    store.overwrite_note_payload(&note.id, &sealed).unwrap();

    match vault.note(&token, &note.id) {
        Err(VaultError::Decryption { .. }) => {}
        Ok(read) => assert_ne!(read.content, content),
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_delete_note_then_read_is_not_found() {
    let (_store, vault) = open_vault();
    let token = setup_and_login(&vault);

    let note = vault
        .create_note(&token, &NoteDraft::new("doomed", "bye"))
        .unwrap();
    vault.delete_note(&token, &note.id).unwrap();

    assert!(matches!(
        vault.note(&token, &note.id),
        Err(VaultError::NoteNotFound(id)) if id == note.id
    ));
    assert!(matches!(
        vault.delete_note(&token, &note.id),
        Err(VaultError::NoteNotFound(_))
    ));
}

#[test]
fn test_empty_content_round_trip() {
    let (store, vault) = open_vault();
    let token = setup_and_login(&vault);

    let note = vault
        .create_note(&token, &NoteDraft::new("empty", ""))
        .expect("empty content should be allowed");

    let stored = store.raw_note_payload(&note.id).unwrap().unwrap();
    assert!(stored.ciphertext.is_empty());
    assert!(stored.iv.is_empty());

    let read_back = vault.note(&token, &note.id).unwrap();
    assert_eq!(read_back.content, "");
}

#[test]
fn test_listing_decrypts_all_notes() {
    let (_store, vault) = open_vault();
    let token = setup_and_login(&vault);

    vault
        .create_note(
            &token,
            &NoteDraft::new("one", "first").with_tags(vec!["alpha".to_string()]),
        )
        .unwrap();
    // Microsecond timestamps need a nudge to guarantee distinct ordering
    std::thread::sleep(std::time::Duration::from_millis(2));
    vault.create_note(&token, &NoteDraft::new("two", "second")).unwrap();

    let notes = vault.notes(&token).unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "two");
    assert_eq!(notes[0].content, "second");
    assert_eq!(notes[1].title, "one");
    assert_eq!(notes[1].content, "first");
    assert_eq!(notes[1].tags, vec!["alpha".to_string()]);
}
