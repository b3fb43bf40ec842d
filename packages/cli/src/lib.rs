//! The vault-migrator process shell: configuration, backend wiring and the
//! single-run or scheduled copy.

pub mod config;
mod error;

use std::future::Future;

use vault_migrator_core::{CancellationToken, Cycle, MigrationJob, Migrator, Scheduler};

pub use config::{BackendConfig, Config, ConfigError, Role, ValidatedConfig};
pub use error::CliError;

/// Run the migration described by `config`.
///
/// Without a schedule this performs one copy and returns its outcome. With a
/// schedule it copies immediately, then on every tick, until `shutdown`
/// resolves. In both cases `shutdown` cancels a copy in progress at its next
/// key.
pub async fn run<S>(config: ValidatedConfig, shutdown: S) -> Result<(), CliError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let source = config.from.open(Role::Source)?;
    let destination = config.to.open(Role::Destination)?;
    tracing::info!(
        from = %config.from.name,
        to = %config.to.name,
        concurrency = config.options.concurrency.get(),
        "backends ready"
    );

    let job = MigrationJob::new(Migrator::with_options(config.options), source, destination);

    match config.schedule {
        None => {
            let cancel = CancellationToken::new();
            let watcher = tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    shutdown.await;
                    tracing::warn!("shutdown requested, stopping after the current key");
                    cancel.cancel();
                }
            });
            let result = job.run(cancel).await;
            watcher.abort();
            result?;
            Ok(())
        }
        Some(schedule) => {
            let handle = Scheduler::new(schedule, job).start();
            shutdown.await;
            tracing::info!("shutdown requested, stopping the scheduler");
            handle.stop();
            handle.join().await;
            Ok(())
        }
    }
}
