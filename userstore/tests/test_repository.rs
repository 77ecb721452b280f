use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use userstore::{KvStore, Repository, StoreError, USER_BUCKET, User, UserStore};

/// Crée un store temporaire pour les tests
fn create_test_store() -> (TempDir, UserStore) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("user.db");
    let store = UserStore::open(&db_path).unwrap();
    (temp_dir, store)
}

#[test]
fn test_open_creates_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("user.db");
    let store = UserStore::open(&db_path);
    assert!(store.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_first_save_assigns_id() {
    let (_temp_dir, store) = create_test_store();

    let mut alice = User::new("Alice Johnson", "alice@example.com");
    store.save(&mut alice).unwrap();
    assert_eq!(alice.id, 1);

    let mut bob = User::new("Bob Smith", "bob@example.com");
    store.save(&mut bob).unwrap();
    assert_eq!(bob.id, 2);

    let fetched = store.get(1).unwrap();
    assert_eq!(fetched, alice);
}

#[test]
fn test_save_existing_keeps_id() {
    let (_temp_dir, store) = create_test_store();

    let mut user = User::new("Bob Smith", "bob@example.com");
    store.save(&mut user).unwrap();
    let id = user.id;

    user.name = "Bob Johnson".to_string();
    store.save(&mut user).unwrap();

    assert_eq!(user.id, id);
    assert_eq!(store.get(id).unwrap().name, "Bob Johnson");
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_get_missing_user() {
    let (_temp_dir, store) = create_test_store();

    let err = store.get(42).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "user with ID 42 not found");
}

#[test]
fn test_delete() {
    let (_temp_dir, store) = create_test_store();

    let mut user = User::new("Carol", "carol@example.com");
    store.save(&mut user).unwrap();

    assert!(store.delete(user.id).unwrap());
    assert!(matches!(store.get(user.id), Err(StoreError::NotFound(_))));
    assert!(!store.delete(user.id).unwrap());
}

#[test]
fn test_ids_are_not_reused_after_delete() {
    let (_temp_dir, store) = create_test_store();

    let mut first = User::new("First", "first@example.com");
    store.save(&mut first).unwrap();
    store.delete(first.id).unwrap();

    let mut second = User::new("Second", "second@example.com");
    store.save(&mut second).unwrap();
    assert!(second.id > first.id);
}

#[test]
fn test_records_are_json_blobs_keyed_by_decimal_id() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("user.db");

    {
        let store = UserStore::open(&db_path).unwrap();
        let mut user = User::new("Alice Johnson", "alice@example.com");
        store.save(&mut user).unwrap();
    }

    // Relecture brute à travers le magasin clé-valeur
    let kv = KvStore::open(&db_path).unwrap();
    let raw = kv.view(|tx| tx.get(USER_BUCKET, "1")).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(value["id"], 1);
    assert_eq!(value["name"], "Alice Johnson");
    assert_eq!(value["email"], "alice@example.com");
}

#[test]
fn test_concurrent_creates_get_distinct_ids() {
    let (_temp_dir, store) = create_test_store();
    let store = Arc::new(store);

    let ids: Vec<i64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    let mut user = User::new(format!("user{i}"), format!("user{i}@example.com"));
                    store.save(&mut user).unwrap();
                    user.id
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<i64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    assert!(ids.iter().all(|id| *id > 0));
    assert_eq!(store.count().unwrap(), 16);
}
