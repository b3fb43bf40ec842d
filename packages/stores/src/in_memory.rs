//! In-memory backend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use vault_migrator_backend::{Backend, BackendError, Entry, KeyPath, DELIMITER};

/// A backend holding every entry in a sorted map.
///
/// # Example
///
/// ```rust
/// use vault_migrator_backend::{Backend, Entry, KeyPath, key};
/// use vault_migrator_stores::InMemoryBackend;
///
/// # tokio_test_block_on(async {
/// let backend = InMemoryBackend::with_entries([
///     Entry::new(key!("a"), "1"),
///     Entry::new(key!("b/c"), "2"),
/// ]);
///
/// let names = backend.list(&KeyPath::root()).await.unwrap();
/// assert_eq!(names, vec!["a", "b/"]);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Default)]
pub struct InMemoryBackend {
    entries: RwLock<BTreeMap<KeyPath, Entry>>,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with initial entries.
    pub fn with_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Remove the entry at `key`, returning it if present.
    pub fn remove(&self, key: &KeyPath) -> Option<Entry> {
        self.entries
            .write()
            .expect("in-memory backend lock poisoned")
            .remove(key)
    }

    /// Copy of every stored entry, keyed by path.
    pub fn snapshot(&self) -> BTreeMap<KeyPath, Entry> {
        self.entries
            .read()
            .expect("in-memory backend lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("in-memory backend lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn list(&self, prefix: &KeyPath) -> Result<Vec<String>, BackendError> {
        let entries = self.entries.read().expect("in-memory backend lock poisoned");

        // Keys sharing a prefix are contiguous in path order, starting at the
        // prefix itself.
        let mut names = BTreeSet::new();
        for key in entries
            .range(prefix.clone()..)
            .map(|(key, _)| key)
            .take_while(|key| key.has_prefix(prefix))
        {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            let mut segments = rest.segments();
            let Some(first) = segments.next() else {
                continue;
            };
            if segments.next().is_some() {
                names.insert(format!("{}{}", first, DELIMITER));
            } else {
                names.insert(first.to_string());
            }
        }

        Ok(names.into_iter().collect())
    }

    async fn get(&self, key: &KeyPath) -> Result<Option<Entry>, BackendError> {
        tracing::debug!(key = %key, "reading entry");
        Ok(self
            .entries
            .read()
            .expect("in-memory backend lock poisoned")
            .get(key)
            .cloned())
    }

    async fn put(&self, entry: Entry) -> Result<(), BackendError> {
        if entry.key.is_root() {
            return Err(BackendError::other("cannot store an entry at the root"));
        }
        tracing::debug!(key = %entry.key, "writing entry");
        self.entries
            .write()
            .expect("in-memory backend lock poisoned")
            .insert(entry.key.clone(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance;
    use vault_migrator_backend::key;

    #[tokio::test]
    async fn lists_immediate_children_only() {
        let backend = InMemoryBackend::with_entries([
            Entry::new(key!("a"), "1"),
            Entry::new(key!("b/c"), "2"),
            Entry::new(key!("b/d/e"), "3"),
            Entry::new(key!("ba"), "4"),
        ]);

        assert_eq!(
            backend.list(&KeyPath::root()).await.unwrap(),
            vec!["a", "b/", "ba"]
        );
        assert_eq!(backend.list(&key!("b")).await.unwrap(), vec!["c", "d/"]);
        assert_eq!(backend.list(&key!("b/d")).await.unwrap(), vec!["e"]);
        assert!(backend.list(&key!("nope")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn key_can_be_leaf_and_subtree() {
        let backend = InMemoryBackend::with_entries([
            Entry::new(key!("b"), "leaf"),
            Entry::new(key!("b/c"), "nested"),
        ]);

        assert_eq!(
            backend.list(&KeyPath::root()).await.unwrap(),
            vec!["b", "b/"]
        );
    }

    #[tokio::test]
    async fn remove_and_snapshot() {
        let backend = InMemoryBackend::with_entries([Entry::new(key!("x"), "v")]);
        assert_eq!(backend.len(), 1);

        assert!(backend.remove(&key!("x")).is_some());
        assert!(backend.is_empty());
        assert!(backend.snapshot().is_empty());
    }

    #[tokio::test]
    async fn root_entry_rejected() {
        let backend = InMemoryBackend::new();
        let result = backend.put(Entry::new(KeyPath::root(), "v")).await;
        assert!(matches!(result, Err(BackendError::Other { .. })));
    }

    #[tokio::test]
    async fn conformance_suite() {
        conformance::put_then_get_works(&InMemoryBackend::new()).await;
        conformance::get_missing_is_none(&InMemoryBackend::new()).await;
        conformance::put_overwrites(&InMemoryBackend::new()).await;
        conformance::metadata_is_preserved(&InMemoryBackend::new()).await;
        conformance::list_marks_subtrees(&InMemoryBackend::new()).await;
        conformance::list_empty_prefix_is_empty(&InMemoryBackend::new()).await;
    }
}
