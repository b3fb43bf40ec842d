//! Behaviour every backend is expected to share.
//!
//! Each check takes a freshly created, empty backend.

use vault_migrator_backend::{Backend, Entry, KeyPath};

fn key(s: &str) -> KeyPath {
    KeyPath::parse(s).unwrap()
}

pub async fn put_then_get_works(backend: &dyn Backend) {
    backend.put(Entry::new(key("a"), "1")).await.unwrap();
    backend.put(Entry::new(key("b/c"), "2")).await.unwrap();

    let entry = backend.get(&key("a")).await.unwrap().unwrap();
    assert_eq!(entry.key, key("a"));
    assert_eq!(entry.value.as_ref(), b"1");

    let entry = backend.get(&key("b/c")).await.unwrap().unwrap();
    assert_eq!(entry.key, key("b/c"));
    assert_eq!(entry.value.as_ref(), b"2");
}

pub async fn get_missing_is_none(backend: &dyn Backend) {
    assert!(backend.get(&key("missing")).await.unwrap().is_none());
    assert!(backend.get(&key("deep/missing")).await.unwrap().is_none());
}

pub async fn put_overwrites(backend: &dyn Backend) {
    backend.put(Entry::new(key("x"), "old")).await.unwrap();
    backend.put(Entry::new(key("x"), "v1")).await.unwrap();

    let entry = backend.get(&key("x")).await.unwrap().unwrap();
    assert_eq!(entry.value.as_ref(), b"v1");
}

pub async fn metadata_is_preserved(backend: &dyn Backend) {
    let entry = Entry::new(key("sys/token"), vec![0u8, 159, 146, 150])
        .with_metadata("version", "7")
        .with_metadata("lease_id", "auth/token/create/abc");
    backend.put(entry.clone()).await.unwrap();

    assert_eq!(backend.get(&key("sys/token")).await.unwrap(), Some(entry));
}

pub async fn list_marks_subtrees(backend: &dyn Backend) {
    backend.put(Entry::new(key("a"), "1")).await.unwrap();
    backend.put(Entry::new(key("b/c"), "2")).await.unwrap();
    backend.put(Entry::new(key("b/d/e"), "3")).await.unwrap();

    let mut root = backend.list(&KeyPath::root()).await.unwrap();
    root.sort();
    assert_eq!(root, vec!["a", "b/"]);

    let mut nested = backend.list(&key("b")).await.unwrap();
    nested.sort();
    assert_eq!(nested, vec!["c", "d/"]);
}

pub async fn list_empty_prefix_is_empty(backend: &dyn Backend) {
    assert!(backend.list(&KeyPath::root()).await.unwrap().is_empty());
    assert!(backend.list(&key("nothing/here")).await.unwrap().is_empty());
}
