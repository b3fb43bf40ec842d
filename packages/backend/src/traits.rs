//! The Backend capability contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{BackendError, Entry, KeyPath};

/// A hierarchical key/value namespace exposing list, get and put.
///
/// Handles are already initialized when they reach the migrator, which
/// borrows them for the duration of a copy and never opens or closes them.
/// Methods take `&self` so a single handle can serve concurrent requests.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Backend>` or
/// `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// List the immediate children of `prefix`.
    ///
    /// Names are relative to `prefix`. Subtrees carry a trailing `/`.
    ///
    /// # Returns
    ///
    /// * `Ok(names)` - The children; an empty list is a valid result.
    /// * `Err(BackendError)` - The prefix could not be listed.
    async fn list(&self, prefix: &KeyPath) -> Result<Vec<String>, BackendError>;

    /// Fetch the entry stored at `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Nothing is stored at `key` (not an error condition).
    /// * `Ok(Some(entry))` - The entry.
    /// * `Err(BackendError)` - A transport or storage error occurred.
    async fn get(&self, key: &KeyPath) -> Result<Option<Entry>, BackendError>;

    /// Store `entry` at `entry.key`, overwriting any previous value.
    async fn put(&self, entry: Entry) -> Result<(), BackendError>;
}

// Blanket implementations for references and smart pointers

#[async_trait]
impl<T: Backend + ?Sized> Backend for &T {
    async fn list(&self, prefix: &KeyPath) -> Result<Vec<String>, BackendError> {
        (**self).list(prefix).await
    }

    async fn get(&self, key: &KeyPath) -> Result<Option<Entry>, BackendError> {
        (**self).get(key).await
    }

    async fn put(&self, entry: Entry) -> Result<(), BackendError> {
        (**self).put(entry).await
    }
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Box<T> {
    async fn list(&self, prefix: &KeyPath) -> Result<Vec<String>, BackendError> {
        self.as_ref().list(prefix).await
    }

    async fn get(&self, key: &KeyPath) -> Result<Option<Entry>, BackendError> {
        self.as_ref().get(key).await
    }

    async fn put(&self, entry: Entry) -> Result<(), BackendError> {
        self.as_ref().put(entry).await
    }
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    async fn list(&self, prefix: &KeyPath) -> Result<Vec<String>, BackendError> {
        self.as_ref().list(prefix).await
    }

    async fn get(&self, key: &KeyPath) -> Result<Option<Entry>, BackendError> {
        self.as_ref().get(key).await
    }

    async fn put(&self, entry: Entry) -> Result<(), BackendError> {
        self.as_ref().put(entry).await
    }
}
