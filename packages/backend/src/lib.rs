//! Backend capability contract for vault-migrator.
//!
//! A backend is a hierarchical key/value namespace that can do exactly three
//! things:
//! - `list`: name the immediate children of a prefix, subtrees marked with a
//!   trailing `/`
//! - `get`: fetch the entry at a key, or report that nothing is there
//! - `put`: overwrite the entry at a key
//!
//! Storage adapters implement [`Backend`]; the migrator only ever talks to
//! this trait.
//!
//! # Example
//!
//! ```rust
//! use vault_migrator_backend::{Backend, BackendError, KeyPath};
//!
//! async fn copy_one(
//!     from: &dyn Backend,
//!     to: &dyn Backend,
//!     k: &KeyPath,
//! ) -> Result<bool, BackendError> {
//!     match from.get(k).await? {
//!         Some(entry) => to.put(entry).await.map(|_| true),
//!         None => Ok(false),
//!     }
//! }
//! ```

pub use bytes::Bytes;

mod entry;
mod error;
mod path;
mod traits;

pub use entry::{Entry, Metadata};
pub use error::BackendError;
pub use path::{Child, KeyPath, PathError, DELIMITER};
pub use traits::Backend;
