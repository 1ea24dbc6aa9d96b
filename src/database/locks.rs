//! Per-file lock manager
//!
//! Hands out one reentrant mutex per record file. The table itself sits behind
//! its own mutex; once it reaches its ceiling, entries nobody else holds a
//! handle to are evicted, least recently used first, until the table is back
//! under half the ceiling.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use parking_lot::{Mutex, ReentrantMutex};
use tracing::debug;

type FileLock = Arc<ReentrantMutex<()>>;

#[derive(Debug)]
struct LockEntry {
    lock: FileLock,
    last_used: u64,
}

#[derive(Debug, Default)]
struct LockTable {
    entries: HashMap<PathBuf, LockEntry>,
    clock: u64,
}

#[derive(Debug)]
pub struct LockManager {
    locks: Mutex<LockTable>,
    max_locks: usize,
}

impl LockManager {
    pub fn new(max_locks: usize) -> Self {
        Self {
            locks: Mutex::new(LockTable::default()),
            max_locks: max_locks.max(1),
        }
    }

    /// Run `f` while holding the lock for `key`
    ///
    /// The closure is the only way to reach a file's lock, so no caller can
    /// touch a record file without holding it.
    pub fn with_lock<R>(&self, key: &Path, f: impl FnOnce() -> R) -> R {
        let handle = self.handle(key);
        let _guard = handle.lock();
        f()
    }

    /// Number of live entries in the table
    pub fn len(&self) -> usize {
        self.locks.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle(&self, key: &Path) -> FileLock {
        let key = normalize(key);
        let mut table = self.locks.lock();
        table.clock += 1;
        let now = table.clock;

        if let Some(existing) = table.entries.get_mut(&key) {
            existing.last_used = now;
            return Arc::clone(&existing.lock);
        }

        if table.entries.len() >= self.max_locks {
            Self::evict_idle(&mut table.entries, self.max_locks / 2);
        }

        let lock = Arc::new(ReentrantMutex::new(()));
        table.entries.insert(key, LockEntry { lock: Arc::clone(&lock), last_used: now });
        lock
    }

    /// Drops idle entries, least recently used first
    ///
    /// Caller holds the table mutex, so a handle count of one cannot grow while we look.
    fn evict_idle(entries: &mut HashMap<PathBuf, LockEntry>, target: usize) {
        let mut idle: Vec<(u64, PathBuf)> = entries
            .iter()
            .filter(|(_, entry)| Arc::strong_count(&entry.lock) == 1 && !entry.lock.is_locked())
            .map(|(path, entry)| (entry.last_used, path.clone()))
            .collect();
        idle.sort_unstable();

        let before = entries.len();
        for (_, path) in idle {
            entries.remove(&path);
            if entries.len() < target {
                break;
            }
        }
        debug!(evicted = before - entries.len(), remaining = entries.len(), "Evicted idle file locks");
    }
}

fn normalize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|dir| dir.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
