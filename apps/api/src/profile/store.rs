//! Profile Store: key-value persistence of student profiles.
//!
//! The whole map lives in memory and is rewritten to a single JSON file on
//! every upsert. Upserts are serialized behind a write lock, and each rewrite
//! goes through a temp file plus rename so a crash never leaves a torn file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::profile::models::{ProfilePatch, StudentProfile};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid profile update: {0}")]
    InvalidPatch(serde_json::Error),

    #[error("failed to serialize profiles: {0}")]
    Serialize(serde_json::Error),

    #[error("profile store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Repository seam for profile persistence.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get(&self, id: &str) -> Option<StudentProfile>;

    /// Shallow-merges `patch` into the record for `id`, creating it if absent,
    /// persists the full snapshot and returns the merged record.
    async fn upsert(&self, id: &str, patch: ProfilePatch) -> Result<StudentProfile, StoreError>;

    async fn len(&self) -> usize;
}

pub struct JsonFileStore {
    path: PathBuf,
    profiles: RwLock<BTreeMap<String, StudentProfile>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, creating its directory if needed.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and also starts empty; it is overwritten by the next upsert.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let dir = parent_dir(&path);
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let profiles = if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str::<BTreeMap<String, StudentProfile>>(&raw) {
                    Ok(map) => map,
                    Err(e) => {
                        warn!("Profile store {} is corrupt, starting empty: {e}", path.display());
                        BTreeMap::new()
                    }
                },
                Err(e) => {
                    warn!("Could not read profile store {}, starting empty: {e}", path.display());
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        info!("Loaded {} profiles from {}", profiles.len(), path.display());
        Ok(Self {
            path,
            profiles: RwLock::new(profiles),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes under the caller's lock and writes on the blocking pool.
    /// The caller keeps the write lock until the file is in place, so
    /// snapshots land in upsert order.
    async fn persist(&self, profiles: &BTreeMap<String, StudentProfile>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(profiles).map_err(StoreError::Serialize)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_snapshot(&path, &json))
            .await
            .map_err(|e| StoreError::Io {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })??;

        debug!("Persisted {} profiles to {}", profiles.len(), self.path.display());
        Ok(())
    }
}

/// Atomically replaces `path` with `json`: temp file, fsync, rename.
fn write_snapshot(path: &Path, json: &str) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(parent_dir(path)).map_err(io_err)?;
    tmp.write_all(json.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[async_trait]
impl ProfileRepository for JsonFileStore {
    async fn get(&self, id: &str) -> Option<StudentProfile> {
        self.profiles.read().await.get(id).cloned()
    }

    async fn upsert(&self, id: &str, patch: ProfilePatch) -> Result<StudentProfile, StoreError> {
        let mut profiles = self.profiles.write().await;

        let merged = match profiles.get(id) {
            Some(existing) => existing.merged(&patch),
            None => StudentProfile::new(id).merged(&patch),
        }
        .map_err(StoreError::InvalidPatch)?;

        let previous = profiles.insert(id.to_string(), merged.clone());
        if let Err(e) = self.persist(&profiles).await {
            match previous {
                Some(p) => profiles.insert(id.to_string(), p),
                None => profiles.remove(id),
            };
            return Err(e);
        }

        Ok(merged)
    }

    async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
