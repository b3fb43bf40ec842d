//! Errors raised by a copy.

use vault_migrator_backend::{BackendError, KeyPath, PathError};

/// Why a copy stopped.
///
/// Every variant names the key path being handled when the copy aborted.
#[derive(thiserror::Error, Debug)]
pub enum MigrateError {
    #[error("failed to list '{path}': {source}")]
    List {
        path: KeyPath,
        #[source]
        source: BackendError,
    },

    #[error("failed to read '{key}': {source}")]
    Get {
        key: KeyPath,
        #[source]
        source: BackendError,
    },

    #[error("failed to write '{key}': {source}")]
    Put {
        key: KeyPath,
        #[source]
        source: BackendError,
    },

    #[error("invalid listing under '{path}': {source}")]
    InvalidListing {
        path: KeyPath,
        #[source]
        source: PathError,
    },

    #[error("copy cancelled before '{path}'")]
    Cancelled { path: KeyPath },
}

impl MigrateError {
    /// The key path the copy was handling when it stopped.
    pub fn path(&self) -> &KeyPath {
        match self {
            MigrateError::List { path, .. }
            | MigrateError::InvalidListing { path, .. }
            | MigrateError::Cancelled { path } => path,
            MigrateError::Get { key, .. } | MigrateError::Put { key, .. } => key,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, MigrateError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use vault_migrator_backend::key;

    #[test]
    fn put_error_names_key() {
        let e = MigrateError::Put {
            key: key!("b/c"),
            source: BackendError::other("disk full"),
        };
        assert_eq!(e.to_string(), "failed to write 'b/c': disk full");
        assert_eq!(e.path(), &key!("b/c"));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn cancelled_error() {
        let e = MigrateError::Cancelled { path: key!("a") };
        assert!(e.is_cancelled());
        assert!(e.to_string().contains("cancelled"));
        assert!(StdError::source(&e).is_none());
    }
}
