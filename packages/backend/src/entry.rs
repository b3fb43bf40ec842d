//! The Entry type - one leaf record with its payload and metadata.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::KeyPath;

/// Backend-specific metadata carried alongside a payload.
///
/// The migrator never interprets these pairs. They are read from the source
/// and handed to the destination verbatim.
pub type Metadata = BTreeMap<String, String>;

/// A leaf record addressed by its full key path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Full path of the leaf.
    pub key: KeyPath,
    /// Opaque payload.
    pub value: Bytes,
    /// Backend-specific metadata (versions, lease information, ...).
    pub metadata: Metadata,
}

impl Entry {
    /// Create an entry without metadata.
    pub fn new(key: KeyPath, value: impl Into<Bytes>) -> Self {
        Entry {
            key,
            value: value.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach one metadata pair.
    #[must_use]
    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }
}
