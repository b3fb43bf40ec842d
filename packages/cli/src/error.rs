use vault_migrator_core::MigrateError;

use crate::config::ConfigError;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Migration failed: {0}")]
    Migrate(#[from] MigrateError),
}
