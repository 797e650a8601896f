//! Tests for Datastore
//!
//! These tests verify:
//! - Open/reopen lifecycle and bucket creation
//! - Single-key get/put/delete/has/get_size
//! - NotFound handling
//! - Sync under both durability strategies
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use arborkv::{ArborError, Config, Datastore, Key, Query, SyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, Datastore) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("store.redb"))
        .build();
    let store = Datastore::open(config).unwrap();
    (temp_dir, store)
}

fn key(path: &str) -> Key {
    Key::new(path)
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_open_creates_file_and_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("store.redb");

    let config = Config::builder().path(&path).build();
    let store = Datastore::open(config).unwrap();

    assert!(path.exists());
    assert_eq!(store.path(), path);
    assert_eq!(store.bucket(), "datastore");
}

#[test]
fn test_open_rejects_empty_bucket() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("store.redb"))
        .bucket("")
        .build();

    let result = Datastore::open(config);
    assert!(matches!(result, Err(ArborError::Config(_))));
}

#[test]
fn test_open_fails_when_path_is_a_directory() {
    let temp_dir = TempDir::new().unwrap();

    let result = Datastore::open_path(temp_dir.path());
    assert!(result.is_err());
}

#[test]
fn test_reopen_reuses_bucket() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.redb");

    {
        let store = Datastore::open_path(&path).unwrap();
        store.put(&key("/a"), b"1").unwrap();
        store.close().unwrap();
    }

    {
        let store = Datastore::open_path(&path).unwrap();
        assert_eq!(store.get(&key("/a")).unwrap(), b"1".to_vec());
    }
}

#[test]
fn test_buckets_are_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.redb");

    {
        let first = Datastore::open(Config::builder().path(&path).bucket("first").build()).unwrap();
        first.put(&key("/shared"), b"first").unwrap();
        first.close().unwrap();
    }

    let second = Datastore::open(Config::builder().path(&path).bucket("second").build()).unwrap();
    assert!(!second.has(&key("/shared")).unwrap());
    second.put(&key("/shared"), b"second").unwrap();
    second.close().unwrap();

    let first = Datastore::open(Config::builder().path(&path).bucket("first").build()).unwrap();
    assert_eq!(first.get(&key("/shared")).unwrap(), b"first".to_vec());
}

#[test]
fn test_operations_after_close_fail() {
    let (_temp, store) = setup_temp_store();
    store.put(&key("/a"), b"1").unwrap();

    store.close().unwrap();
    assert!(store.is_closed());

    assert!(matches!(store.get(&key("/a")), Err(ArborError::Closed)));
    assert!(matches!(store.put(&key("/a"), b"2"), Err(ArborError::Closed)));
    assert!(matches!(store.query(Query::default()), Err(ArborError::Closed)));
    assert!(matches!(store.batch(), Err(ArborError::Closed)));

    // Closing twice is fine
    store.close().unwrap();
}

// =============================================================================
// Single-Key Operations Tests
// =============================================================================

#[test]
fn test_put_get() {
    let (_temp, store) = setup_temp_store();

    store.put(&key("/hello"), b"world").unwrap();

    assert_eq!(store.get(&key("/hello")).unwrap(), b"world".to_vec());
}

#[test]
fn test_get_absent_key_is_not_found() {
    let (_temp, store) = setup_temp_store();

    let err = store.get(&key("/missing")).unwrap_err();
    assert!(err.is_not_found());
    assert!(!store.has(&key("/missing")).unwrap());
    assert_eq!(store.get_size(&key("/missing")).unwrap(), 0);
}

#[test]
fn test_empty_value_is_distinct_from_absent() {
    let (_temp, store) = setup_temp_store();

    store.put(&key("/empty"), b"").unwrap();

    assert_eq!(store.get(&key("/empty")).unwrap(), Vec::<u8>::new());
    assert!(store.has(&key("/empty")).unwrap());
    assert_eq!(store.get_size(&key("/empty")).unwrap(), 0);
}

#[test]
fn test_put_overwrite() {
    let (_temp, store) = setup_temp_store();

    store.put(&key("/k"), b"value1").unwrap();
    store.put(&key("/k"), b"value2").unwrap();

    assert_eq!(store.get(&key("/k")).unwrap(), b"value2".to_vec());
}

#[test]
fn test_put_copies_caller_buffer() {
    let (_temp, store) = setup_temp_store();

    let mut buffer = b"original".to_vec();
    store.put(&key("/k"), &buffer).unwrap();
    buffer.copy_from_slice(b"mutated!");

    assert_eq!(store.get(&key("/k")).unwrap(), b"original".to_vec());
}

#[test]
fn test_delete() {
    let (_temp, store) = setup_temp_store();

    store.put(&key("/k"), b"value").unwrap();
    store.delete(&key("/k")).unwrap();

    assert!(store.get(&key("/k")).unwrap_err().is_not_found());
    assert!(!store.has(&key("/k")).unwrap());
}

#[test]
fn test_delete_absent_key() {
    let (_temp, store) = setup_temp_store();
    store.put(&key("/other"), b"x").unwrap();

    store.delete(&key("/missing")).unwrap();

    assert_eq!(store.get(&key("/other")).unwrap(), b"x".to_vec());
}

#[test]
fn test_get_size() {
    let (_temp, store) = setup_temp_store();

    store.put(&key("/k"), &[7u8; 1234]).unwrap();

    assert_eq!(store.get_size(&key("/k")).unwrap(), 1234);
}

#[test]
fn test_large_and_binary_values() {
    let (_temp, store) = setup_temp_store();

    let large = vec![0xAB; 100_000];
    let binary = b"\xFF\x00\xAB\xCD\x00".to_vec();
    store.put(&key("/large"), &large).unwrap();
    store.put(&key("/binary"), &binary).unwrap();

    assert_eq!(store.get(&key("/large")).unwrap(), large);
    assert_eq!(store.get(&key("/binary")).unwrap(), binary);
}

#[test]
fn test_keys_are_cleaned() {
    let (_temp, store) = setup_temp_store();

    store.put(&Key::new("a//b/"), b"v").unwrap();

    assert_eq!(store.get(&key("/a/b")).unwrap(), b"v".to_vec());
}

// =============================================================================
// Sync Tests
// =============================================================================

#[test]
fn test_sync_every_commit_is_noop() {
    let (_temp, store) = setup_temp_store();
    store.put(&key("/k"), b"v").unwrap();

    store.sync(&Key::root()).unwrap();

    assert_eq!(store.get(&key("/k")).unwrap(), b"v".to_vec());
}

#[test]
fn test_manual_sync_persists_writes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.redb");
    let config = Config::builder()
        .path(&path)
        .sync_strategy(SyncStrategy::Manual)
        .build();

    {
        let store = Datastore::open(config.clone()).unwrap();
        store.put(&key("/a"), b"1").unwrap();
        store.put(&key("/b"), b"2").unwrap();

        // Visible to readers before the flush
        assert_eq!(store.get(&key("/a")).unwrap(), b"1".to_vec());

        store.sync(&key("/a")).unwrap();
        store.close().unwrap();
    }

    let store = Datastore::open(config).unwrap();
    assert_eq!(store.get(&key("/a")).unwrap(), b"1".to_vec());
    assert_eq!(store.get(&key("/b")).unwrap(), b"2".to_vec());
}

#[test]
fn test_drop_flushes_manual_writes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.redb");
    let config = Config::builder()
        .path(&path)
        .sync_strategy(SyncStrategy::Manual)
        .build();

    {
        let store = Datastore::open(config.clone()).unwrap();
        store.put(&key("/a"), b"1").unwrap();
    }

    let store = Datastore::open(config).unwrap();
    assert_eq!(store.get(&key("/a")).unwrap(), b"1".to_vec());
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_reads() {
    let (_temp, store) = setup_temp_store();
    let store = Arc::new(store);

    for i in 0..100 {
        store
            .put(&key(&format!("/key{}", i)), format!("value{}", i).as_bytes())
            .unwrap();
    }

    let mut handles = vec![];
    for _ in 0..4 {
        let store_clone = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let result = store_clone.get(&key(&format!("/key{}", i))).unwrap();
                assert_eq!(result, format!("value{}", i).into_bytes());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_writes() {
    let (_temp, store) = setup_temp_store();
    let store = Arc::new(store);

    let mut handles = vec![];
    for t in 0..4 {
        let store_clone = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let k = key(&format!("/thread{}/key{}", t, i));
                store_clone.put(&k, format!("value{}", i).as_bytes()).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..4 {
        for i in 0..25 {
            let k = key(&format!("/thread{}/key{}", t, i));
            assert_eq!(store.get(&k).unwrap(), format!("value{}", i).into_bytes());
        }
    }
}
