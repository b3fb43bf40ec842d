//! The JSON configuration file.
//!
//! ```json
//! {
//!   "from": { "name": "file", "config": { "path": "/var/lib/vault" } },
//!   "to": { "name": "file", "config": { "path": "/mnt/vault-copy" } },
//!   "schedule": "@every 30m",
//!   "concurrency": 4
//! }
//! ```

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use vault_migrator_backend::Backend;
use vault_migrator_core::{MigratorOptions, Schedule, ScheduleError};
use vault_migrator_stores::{FileBackend, FileBackendError, InMemoryBackend};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file ({path}): {error}")]
    Read {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Please define a source (key: from)")]
    MissingSource,

    #[error("Please define a destination (key: to)")]
    MissingDestination,

    #[error("Unknown backend '{name}' (supported: file, inmem)")]
    UnknownBackend { name: String },

    #[error("Backend 'inmem' starts empty and cannot be used as a source")]
    EmptySource,

    #[error("Backend '{backend}' requires the config option '{option}'")]
    MissingOption { backend: String, option: String },

    #[error("Could not open backend '{backend}': {source}")]
    OpenBackend {
        backend: String,
        #[source]
        source: FileBackendError,
    },

    #[error("Invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// A storage backend as named in the config file.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Backend kind: `file` or `inmem`. `inmem` keeps nothing once the
    /// process exits, so it only serves as a dry-run destination.
    pub name: String,
    /// Backend specific options.
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

/// Which side of the copy a backend serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Destination,
}

impl BackendConfig {
    /// Build the backend handle.
    ///
    /// A `file` source must already exist; a `file` destination is created
    /// when missing. `inmem` is refused as a source.
    pub fn open(&self, role: Role) -> Result<Arc<dyn Backend>, ConfigError> {
        match self.name.as_str() {
            "file" => {
                let path = self
                    .config
                    .get("path")
                    .ok_or_else(|| ConfigError::MissingOption {
                        backend: self.name.clone(),
                        option: "path".to_string(),
                    })?;
                let root = PathBuf::from(path);
                let backend = match role {
                    Role::Source => FileBackend::new(root),
                    Role::Destination => FileBackend::create(root),
                }
                .map_err(|source| ConfigError::OpenBackend {
                    backend: self.name.clone(),
                    source,
                })?;
                Ok(Arc::new(backend))
            }
            "inmem" => match role {
                Role::Source => Err(ConfigError::EmptySource),
                Role::Destination => Ok(Arc::new(InMemoryBackend::new())),
            },
            other => Err(ConfigError::UnknownBackend {
                name: other.to_string(),
            }),
        }
    }
}

/// The config file as written.
#[derive(Deserialize, Debug, Default)]
pub struct Config {
    /// Source backend.
    pub from: Option<BackendConfig>,
    /// Destination backend.
    pub to: Option<BackendConfig>,
    /// Optional repeat schedule.
    #[serde(default)]
    pub schedule: Option<String>,
    /// Optional bound on concurrent backend requests.
    #[serde(default)]
    pub concurrency: Option<usize>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        Config::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Config, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Check everything that can be checked before touching a backend.
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let from = self.from.ok_or(ConfigError::MissingSource)?;
        let to = self.to.ok_or(ConfigError::MissingDestination)?;
        let schedule = self.schedule.as_deref().map(Schedule::parse).transpose()?;

        let mut options = MigratorOptions::default();
        if let Some(concurrency) = self.concurrency {
            options.concurrency =
                NonZeroUsize::new(concurrency).ok_or(ConfigError::ZeroConcurrency)?;
        }

        Ok(ValidatedConfig {
            from,
            to,
            schedule,
            options,
        })
    }
}

/// A config with both backends present and the schedule parsed.
#[derive(Debug)]
pub struct ValidatedConfig {
    pub from: BackendConfig,
    pub to: BackendConfig,
    pub schedule: Option<Schedule>,
    pub options: MigratorOptions,
}
