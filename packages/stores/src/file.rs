use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use vault_migrator_backend::{Backend, BackendError, Entry, KeyPath, DELIMITER};

use crate::FileBackendError;

/// Leaf files carry this prefix so leaf `x` and subtree `x/` can coexist.
const LEAF_PREFIX: &str = "_";

/// On-disk form of one entry.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StoredEntry {
    key: String,
    value: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

/// A backend storing one JSON file per entry under a root directory.
///
/// Key `a/b/c` lives in `<root>/a/b/_c`; every intermediate segment is a
/// directory. Payloads are base64 encoded inside the JSON document.
///
/// Vault's layout shares one limitation: leaf `x` and a subtree whose
/// segment is `_x` map to the same path, `<dir>/_x`. Whichever is written
/// second fails with [`BackendError::Io`].
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open an existing root directory.
    pub fn new(root: PathBuf) -> Result<FileBackend, FileBackendError> {
        let attr = std::fs::metadata(&root).map_err(|error| FileBackendError::RootPathInvalid {
            path: root.clone(),
            error,
        })?;

        if !attr.is_dir() {
            return Err(FileBackendError::RootPathInvalid {
                path: root,
                error: io::Error::other("Root path must be a directory."),
            });
        }

        match root.canonicalize() {
            Ok(root) => Ok(FileBackend { root }),
            Err(error) => Err(FileBackendError::RootPathInvalid { path: root, error }),
        }
    }

    /// Create the root directory if needed, then open it.
    pub fn create(root: PathBuf) -> Result<FileBackend, FileBackendError> {
        std::fs::create_dir_all(&root).map_err(|error| FileBackendError::RootPathInvalid {
            path: root.clone(),
            error,
        })?;
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir_path(&self, prefix: &KeyPath) -> Result<PathBuf, BackendError> {
        let mut dir = self.root.clone();
        for segment in prefix.segments() {
            Self::check_segment(prefix, segment)?;
            dir.push(segment);
        }
        Ok(dir)
    }

    fn leaf_path(&self, key: &KeyPath) -> Result<PathBuf, BackendError> {
        let (Some(parent), Some(name)) = (key.parent(), key.name()) else {
            return Err(BackendError::other("cannot address an entry at the root"));
        };
        Self::check_segment(key, name)?;
        Ok(self
            .dir_path(&parent)?
            .join(format!("{}{}", LEAF_PREFIX, name)))
    }

    /// Segments that would escape or alias the root are refused.
    fn check_segment(key: &KeyPath, segment: &str) -> Result<(), BackendError> {
        if segment == "." || segment == ".." || segment.contains(std::path::MAIN_SEPARATOR) {
            return Err(BackendError::Corrupt {
                path: key.clone(),
                message: format!("segment '{}' cannot be stored on disk", segment),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FileBackend {
    async fn list(&self, prefix: &KeyPath) -> Result<Vec<String>, BackendError> {
        let dir = self.dir_path(prefix)?;
        tracing::debug!("Listing {}...", dir.display());

        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(BackendError::io(prefix, error)),
        };

        let mut names = Vec::new();
        while let Some(dir_entry) = read_dir
            .next_entry()
            .await
            .map_err(|error| BackendError::io(prefix, error))?
        {
            let Ok(name) = dir_entry.file_name().into_string() else {
                tracing::warn!(
                    "Skipping non UTF-8 file name in {}: {:?}",
                    dir.display(),
                    dir_entry.file_name()
                );
                continue;
            };
            let file_type = dir_entry
                .file_type()
                .await
                .map_err(|error| BackendError::io(prefix, error))?;

            if file_type.is_dir() {
                names.push(format!("{}{}", name, DELIMITER));
            } else if let Some(leaf) = name.strip_prefix(LEAF_PREFIX) {
                if !leaf.is_empty() {
                    names.push(leaf.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn get(&self, key: &KeyPath) -> Result<Option<Entry>, BackendError> {
        let file_path = self.leaf_path(key)?;
        tracing::debug!("Reading {}...", file_path.display());

        let raw = match tokio::fs::read(&file_path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(BackendError::io(key, error)),
        };

        let stored: StoredEntry =
            serde_json::from_slice(&raw).map_err(|error| BackendError::Corrupt {
                path: key.clone(),
                message: error.to_string(),
            })?;
        let value = BASE64
            .decode(stored.value.as_bytes())
            .map_err(|error| BackendError::Corrupt {
                path: key.clone(),
                message: format!("value is not valid base64: {}", error),
            })?;

        Ok(Some(Entry {
            key: key.clone(),
            value: value.into(),
            metadata: stored.metadata,
        }))
    }

    async fn put(&self, entry: Entry) -> Result<(), BackendError> {
        let file_path = self.leaf_path(&entry.key)?;
        tracing::debug!("Writing {}...", file_path.display());

        let stored = StoredEntry {
            key: entry.key.to_string(),
            value: BASE64.encode(&entry.value),
            metadata: entry.metadata,
        };
        let serialized = serde_json::to_vec(&stored).map_err(|error| BackendError::Corrupt {
            path: entry.key.clone(),
            message: error.to_string(),
        })?;

        let Some(dir) = file_path.parent() else {
            return Err(BackendError::other(format!(
                "File path ({}) has no parent directory",
                file_path.display()
            )));
        };
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|error| BackendError::io(&entry.key, error))?;

        // Write beside the target and rename over it so readers never see a
        // partially written entry. The dot prefix keeps it out of listings.
        let tmp_path = dir.join(format!(
            ".{}.tmp",
            file_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("entry")
        ));
        tokio::fs::write(&tmp_path, &serialized)
            .await
            .map_err(|error| BackendError::io(&entry.key, error))?;
        tokio::fs::rename(&tmp_path, &file_path)
            .await
            .map_err(|error| BackendError::io(&entry.key, error))?;

        Ok(())
    }
}
