//! The vault-migrator copy engine.
//!
//! [`Migrator`] walks a source [`Backend`](vault_migrator_backend::Backend)
//! one listing at a time and writes every leaf it finds into a destination
//! backend. [`Scheduler`] repeats that copy on a [`Schedule`].
//!
//! Copies are one-directional and idempotent by overwrite: running the same
//! copy twice leaves the destination as one run would, and keys that exist
//! only in the destination are never touched.

mod error;
mod migrator;
mod schedule;
mod scheduler;

pub use error::MigrateError;
pub use migrator::{CopyReport, Migrator, MigratorOptions};
pub use schedule::{Schedule, ScheduleError};
pub use scheduler::{Cycle, MigrationJob, Scheduler, SchedulerHandle};

pub use tokio_util::sync::CancellationToken;
