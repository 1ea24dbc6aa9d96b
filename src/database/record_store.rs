//! Crash-safe JSON record store
//!
//! Every read and write of a record file happens under that file's lock from
//! [`LockManager`]. Writes snapshot the current file to `<file>.backup`, write
//! the new content to a temp file in the same directory and rename it over the
//! target, so readers never observe a half-written file.
//!
//! All operations here block; async callers go through `spawn_blocking`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};
use crate::utils::errors::{ClubError, Result};
use crate::utils::logging::{log_storage_failure, log_store_operation};
use super::locks::LockManager;

/// Records that receive a sequential id when appended
pub trait Sequenced {
    fn assign_sequence(&mut self, id: u64);
}

/// Result of an [`RecordStore::atomic_append`] that did not hit an I/O error
#[derive(Debug)]
pub enum AppendOutcome<T> {
    /// The record was stored; carries the list as written
    Appended(Vec<T>),
    /// The uniqueness check refused the record; carries the untouched list
    Rejected { message: String, records: Vec<T> },
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    locks: Arc<LockManager>,
}

impl RecordStore {
    pub fn new(max_file_locks: usize) -> Self {
        Self {
            locks: Arc::new(LockManager::new(max_file_locks)),
        }
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    /// Read a JSON list; corrupt or missing files degrade to an empty list
    pub fn read<T: DeserializeOwned>(&self, path: &Path) -> Vec<T> {
        self.read_document(path)
    }

    /// Read any JSON document, falling back to the backup and then to `Default`
    pub fn read_document<D: DeserializeOwned + Default>(&self, path: &Path) -> D {
        self.locks.with_lock(path, || read_unlocked(path))
    }

    /// Replace a file's content atomically
    pub fn write<D: Serialize + ?Sized>(&self, path: &Path, data: &D) -> Result<()> {
        self.locks.with_lock(path, || write_unlocked(path, data))
    }

    /// Read, check, assign the next sequential id and write under one lock acquisition
    ///
    /// `check` sees the current list and the candidate; returning a message
    /// rejects the candidate without touching the file.
    pub fn atomic_append<T, F>(&self, path: &Path, mut record: T, check: F) -> Result<AppendOutcome<T>>
    where
        T: Serialize + DeserializeOwned + Sequenced,
        F: FnOnce(&[T], &T) -> Option<String>,
    {
        self.locks.with_lock(path, || {
            let started = Instant::now();
            let mut records: Vec<T> = read_unlocked(path);

            if let Some(message) = check(&records, &record) {
                return Ok(AppendOutcome::Rejected { message, records });
            }

            record.assign_sequence(records.len() as u64 + 1);
            records.push(record);
            write_unlocked(path, &records)?;

            log_store_operation("atomic_append", &file_label(path), started.elapsed().as_millis() as u64, records.len());
            Ok(AppendOutcome::Appended(records))
        })
    }

    /// Read-modify-write of a whole document under one lock acquisition
    ///
    /// Nothing is written when `f` returns an error.
    pub fn modify<D, R, F>(&self, path: &Path, f: F) -> Result<R>
    where
        D: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut D) -> Result<R>,
    {
        self.locks.with_lock(path, || {
            let mut document: D = read_unlocked(path);
            let result = f(&mut document)?;
            write_unlocked(path, &document)?;
            Ok(result)
        })
    }

    /// Record files (`*_registrations.json`) in a directory
    pub fn list_files(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.ends_with("_registrations.json"))
            })
            .collect();
        files.sort();
        files
    }
}

/// Run blocking store work off the async executor
pub async fn run_blocking<R, F>(f: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ClubError::Storage(format!("blocking task failed: {}", e)))?
}

/// Sibling file holding the previous content
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parse_file<D: DeserializeOwned>(path: &Path) -> std::result::Result<D, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}

fn read_unlocked<D: DeserializeOwned + Default>(path: &Path) -> D {
    if !path.exists() {
        return D::default();
    }

    match parse_file(path) {
        Ok(document) => document,
        Err(error) => {
            log_storage_failure("read", path, &error);
            let backup = backup_path(path);
            if backup.exists() {
                info!(backup = %backup.display(), "Attempting to recover from backup");
                match parse_file(&backup) {
                    Ok(document) => return document,
                    Err(error) => log_storage_failure("read_backup", &backup, &error),
                }
            }
            D::default()
        }
    }
}

fn write_unlocked<D: Serialize + ?Sized>(path: &Path, data: &D) -> Result<()> {
    if path.exists() {
        if let Err(e) = fs::copy(path, backup_path(path)) {
            warn!(path = %path.display(), error = %e, "Could not create backup");
        }
    }

    let staged = stage(path, data)?;
    staged.persist(path).map_err(|e| storage_error("rename", path, e.error))?;
    Ok(())
}

/// Serialize into a synced temp file next to `path`; dropping it discards it
fn stage<D: Serialize + ?Sized>(path: &Path, data: &D) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| storage_error("create_dir", &dir, e))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| storage_error("create_temp", path, e))?;

    let body = serde_json::to_vec_pretty(data)?;
    temp.write_all(&body).map_err(|e| storage_error("write_temp", path, e))?;
    temp.as_file().sync_all().map_err(|e| storage_error("sync_temp", path, e))?;
    Ok(temp)
}

fn storage_error(operation: &str, path: &Path, error: std::io::Error) -> ClubError {
    log_storage_failure(operation, path, &error.to_string());
    ClubError::Storage(format!("{} failed: {}", operation, error))
}
