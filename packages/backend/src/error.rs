//! Error types reported by backends.
//!
//! These are transport and storage failures only. Absence of a key is not an
//! error; `Backend::get` reports it as `Ok(None)`.

use crate::KeyPath;

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    /// I/O failure while touching the given key or prefix.
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: KeyPath,
        #[source]
        source: std::io::Error,
    },

    /// Stored data could not be decoded into an entry.
    #[error("corrupt entry at '{path}': {message}")]
    Corrupt { path: KeyPath, message: String },

    /// Any other implementation failure.
    #[error("{message}")]
    Other { message: String },
}

impl BackendError {
    pub fn io(path: &KeyPath, source: std::io::Error) -> Self {
        BackendError::Io {
            path: path.clone(),
            source,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        BackendError::Other {
            message: message.into(),
        }
    }
}
