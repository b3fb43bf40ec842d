use std::io;
use std::path::PathBuf;

/// Errors raised while opening a [`FileBackend`](crate::FileBackend).
#[derive(thiserror::Error, Debug)]
pub enum FileBackendError {
    #[error("Root path ({path}) is invalid: {error}")]
    RootPathInvalid { path: PathBuf, error: io::Error },
}
