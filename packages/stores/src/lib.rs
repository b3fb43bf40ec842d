//! Reference storage backends for vault-migrator.
//!
//! - [`InMemoryBackend`]: a sorted map, useful for tests and dry runs.
//! - [`FileBackend`]: a directory tree using the on-disk layout of
//!   HashiCorp Vault's `file` storage, so an existing Vault data directory can
//!   be read or written directly.

mod error;
mod file;
mod in_memory;

#[cfg(test)]
mod conformance;

pub use error::FileBackendError;
pub use file::FileBackend;
pub use in_memory::InMemoryBackend;
