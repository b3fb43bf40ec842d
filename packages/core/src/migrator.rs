//! The recursive copy walk.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use futures::{FutureExt, TryStreamExt};
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;
use vault_migrator_backend::{Backend, Child, Entry, KeyPath};

use crate::MigrateError;

/// Tuning for a [`Migrator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MigratorOptions {
    /// Upper bound on backend requests in flight at once.
    ///
    /// With `1` the walk is strictly sequential in listing order. Above that,
    /// siblings are visited concurrently and the first error aborts the copy.
    pub concurrency: NonZeroUsize,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::MIN,
        }
    }
}

/// What a successful copy did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Entries written to the destination.
    pub leaves_copied: usize,
    /// Subtrees descended into.
    pub subtrees_visited: usize,
    /// Leaves that were listed but gone by the time they were read.
    pub skipped: usize,
}

/// Copies every entry below a key path from one backend to another.
///
/// The walk lists the source one level at a time, descends into subtrees and
/// copies leaves with a `get` followed by a `put`. Destination writes always
/// overwrite, so a failed copy is recovered by running it again. Nothing is
/// ever deleted from the destination.
///
/// # Example
///
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use vault_migrator_backend::{Backend, Entry, KeyPath, key};
/// use vault_migrator_core::Migrator;
/// use vault_migrator_stores::InMemoryBackend;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let source = InMemoryBackend::with_entries([Entry::new(key!("b/c"), "2")]);
/// let destination = InMemoryBackend::new();
///
/// let report = Migrator::new()
///     .copy(&KeyPath::root(), &source, &destination, &CancellationToken::new())
///     .await
///     .unwrap();
///
/// assert_eq!(report.leaves_copied, 1);
/// assert!(destination.get(&key!("b/c")).await.unwrap().is_some());
/// # });
/// ```
#[derive(Clone, Debug, Default)]
pub struct Migrator {
    options: MigratorOptions,
}

impl Migrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MigratorOptions) -> Self {
        Self { options }
    }

    /// Copy everything below `root` from `source` to `destination`.
    ///
    /// `cancel` is checked before each listed key is visited. Any backend
    /// failure aborts the copy and is returned with the key it concerned;
    /// entries already written stay written.
    pub async fn copy(
        &self,
        root: &KeyPath,
        source: &dyn Backend,
        destination: &dyn Backend,
        cancel: &CancellationToken,
    ) -> Result<CopyReport, MigrateError> {
        let concurrency = self.options.concurrency.get();
        let walk = Walk {
            source,
            destination,
            cancel,
            requests: (concurrency > 1).then(|| Semaphore::new(concurrency)),
            fan_out: concurrency,
            stats: Stats::default(),
        };

        walk.copy_tree(root.clone()).await?;

        let report = walk.stats.report();
        if root.is_root() {
            tracing::info!(
                leaves_copied = report.leaves_copied,
                subtrees_visited = report.subtrees_visited,
                skipped = report.skipped,
                "all the keys have been moved"
            );
        }
        Ok(report)
    }
}

#[derive(Default)]
struct Stats {
    leaves_copied: AtomicUsize,
    subtrees_visited: AtomicUsize,
    skipped: AtomicUsize,
}

impl Stats {
    fn report(&self) -> CopyReport {
        CopyReport {
            leaves_copied: self.leaves_copied.load(Ordering::Relaxed),
            subtrees_visited: self.subtrees_visited.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// State shared by every level of one copy.
struct Walk<'a> {
    source: &'a dyn Backend,
    destination: &'a dyn Backend,
    cancel: &'a CancellationToken,
    // None in sequential mode.
    requests: Option<Semaphore>,
    fan_out: usize,
    stats: Stats,
}

impl Walk<'_> {
    fn copy_tree(&self, path: KeyPath) -> BoxFuture<'_, Result<(), MigrateError>> {
        async move {
            let names = {
                let _permit = self.permit().await;
                self.source
                    .list(&path)
                    .await
                    .map_err(|source| MigrateError::List {
                        path: path.clone(),
                        source,
                    })?
            };

            let children = names
                .iter()
                .map(String::as_str)
                .map(Child::from_listed)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| MigrateError::InvalidListing {
                    path: path.clone(),
                    source,
                })?;

            if self.requests.is_none() {
                for child in children {
                    self.visit(&path, child).await?;
                }
                Ok(())
            } else {
                futures::stream::iter(children.into_iter().map(Ok::<_, MigrateError>))
                    .try_for_each_concurrent(self.fan_out, |child| self.visit(&path, child))
                    .await
            }
        }
        .boxed()
    }

    async fn visit(&self, parent: &KeyPath, child: Child) -> Result<(), MigrateError> {
        let key = child.under(parent);
        if self.cancel.is_cancelled() {
            return Err(MigrateError::Cancelled { path: key });
        }

        tracing::info!(key = %key, "moving key");
        match child {
            Child::Subtree(_) => {
                self.stats.subtrees_visited.fetch_add(1, Ordering::Relaxed);
                self.copy_tree(key).await
            }
            Child::Leaf(_) => self.copy_leaf(key).await,
        }
    }

    async fn copy_leaf(&self, key: KeyPath) -> Result<(), MigrateError> {
        let fetched = {
            let _permit = self.permit().await;
            self.source
                .get(&key)
                .await
                .map_err(|source| MigrateError::Get {
                    key: key.clone(),
                    source,
                })?
        };

        // Deleted between the listing and the read.
        let Some(entry) = fetched else {
            tracing::debug!(key = %key, "key vanished from source, skipping");
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        };

        let entry = Entry {
            key: key.clone(),
            ..entry
        };
        let _permit = self.permit().await;
        self.destination
            .put(entry)
            .await
            .map_err(|source| MigrateError::Put { key, source })?;
        self.stats.leaves_copied.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn permit(&self) -> Option<SemaphorePermit<'_>> {
        match &self.requests {
            Some(requests) => requests.acquire().await.ok(),
            None => None,
        }
    }
}
