//! Repeated copies on a schedule.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vault_migrator_backend::{Backend, KeyPath};

use crate::{CopyReport, MigrateError, Migrator, Schedule};

/// One unit of scheduled work.
#[async_trait]
pub trait Cycle: Send + Sync + 'static {
    async fn run(&self, cancel: CancellationToken) -> Result<CopyReport, MigrateError>;
}

/// A full copy between two long-lived backend handles.
pub struct MigrationJob {
    migrator: Migrator,
    root: KeyPath,
    source: Arc<dyn Backend>,
    destination: Arc<dyn Backend>,
}

impl MigrationJob {
    pub fn new(migrator: Migrator, source: Arc<dyn Backend>, destination: Arc<dyn Backend>) -> Self {
        Self {
            migrator,
            root: KeyPath::root(),
            source,
            destination,
        }
    }

    /// Restrict the copy to the subtree at `root`.
    #[must_use]
    pub fn with_root(mut self, root: KeyPath) -> Self {
        self.root = root;
        self
    }
}

#[async_trait]
impl Cycle for MigrationJob {
    async fn run(&self, cancel: CancellationToken) -> Result<CopyReport, MigrateError> {
        self.migrator
            .copy(
                &self.root,
                self.source.as_ref(),
                self.destination.as_ref(),
                &cancel,
            )
            .await
    }
}

/// Runs a [`Cycle`] now and then again at every tick of a [`Schedule`].
///
/// A failed cycle is logged and the scheduler waits for the next tick.
/// Cycles never overlap: the next tick is computed once the previous cycle
/// has returned. Panics inside a cycle are not caught; they resurface from
/// [`SchedulerHandle::join`].
pub struct Scheduler<C> {
    schedule: Schedule,
    cycle: C,
    run_immediately: bool,
    cancel: CancellationToken,
}

impl<C: Cycle> Scheduler<C> {
    pub fn new(schedule: Schedule, cycle: C) -> Self {
        Self {
            schedule,
            cycle,
            run_immediately: true,
            cancel: CancellationToken::new(),
        }
    }

    /// Whether [`Scheduler::start`] runs a cycle before the first tick.
    /// Defaults to `true`.
    #[must_use]
    pub fn run_immediately(mut self, run_immediately: bool) -> Self {
        self.run_immediately = run_immediately;
        self
    }

    /// Run a single cycle now, logging its outcome.
    pub async fn run_cycle(&self) -> Result<CopyReport, MigrateError> {
        let result = self.cycle.run(self.cancel.child_token()).await;
        match &result {
            Ok(report) => tracing::info!(
                leaves_copied = report.leaves_copied,
                skipped = report.skipped,
                "migration cycle finished"
            ),
            Err(error) if error.is_cancelled() => {
                tracing::warn!(%error, "migration cycle interrupted")
            }
            Err(error) => tracing::error!(%error, "migration cycle failed"),
        }
        result
    }

    /// Spawn the schedule loop on the current tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run_loop());
        SchedulerHandle { cancel, task }
    }

    async fn run_loop(self) {
        tracing::info!(schedule = %self.schedule, "scheduler started");

        if self.run_immediately {
            let _ = self.run_cycle().await;
        }

        loop {
            let Some(delay) = self.schedule.delay_after(Utc::now()) else {
                tracing::info!("schedule has no further ticks");
                break;
            };
            tracing::info!(?delay, "Waiting the next schedule");

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            if self.cancel.is_cancelled() {
                break;
            }

            let _ = self.run_cycle().await;
        }

        tracing::info!("scheduler stopped");
    }
}

/// Handle to a running [`Scheduler`].
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Ask the scheduler to stop. A cycle in progress is cancelled at its
    /// next key.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the schedule loop to exit.
    pub async fn join(self) {
        match self.task.await {
            Ok(()) => {}
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(error) => tracing::warn!(%error, "scheduler task was aborted"),
        }
    }
}
