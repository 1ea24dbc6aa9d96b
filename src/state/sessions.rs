//! Admin session storage
//!
//! In-memory token table for the admin panel. Tokens expire after the
//! configured TTL; expired entries are dropped lazily on lookup and by a
//! periodic cleanup task that lives as long as its handle.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use crate::utils::helpers::generate_token;

/// One logged-in admin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
struct SessionTable {
    sessions: Mutex<HashMap<String, AdminSession>>,
    ttl: chrono::Duration,
}

/// Process-scoped admin token table
#[derive(Debug, Clone)]
pub struct AdminSessionStore {
    inner: Arc<SessionTable>,
}

impl AdminSessionStore {
    pub fn new(ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(1));
        Self {
            inner: Arc::new(SessionTable {
                sessions: Mutex::new(HashMap::new()),
                ttl,
            }),
        }
    }

    /// Issue a fresh token for `username`
    pub fn create(&self, username: &str) -> String {
        let token = generate_token(32);
        let now = Utc::now();
        let session = AdminSession {
            username: username.to_string(),
            created_at: now,
            expires_at: now + self.inner.ttl,
        };
        self.inner.sessions.lock().insert(token.clone(), session);
        debug!(username = %username, "Admin session created");
        token
    }

    /// Live session for `token`; an expired one is removed
    pub fn get(&self, token: &str) -> Option<AdminSession> {
        let mut sessions = self.inner.sessions.lock();
        match sessions.get(token) {
            Some(session) if session.is_expired_at(Utc::now()) => {
                sessions.remove(token);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    /// Drop a token; returns whether it existed
    pub fn remove(&self, token: &str) -> bool {
        self.inner.sessions.lock().remove(token).is_some()
    }

    /// Remove every session expired at `now`; returns how many went
    pub fn cleanup_expired_at(&self, now: DateTime<Utc>) -> usize {
        purge(&self.inner, now)
    }

    pub fn len(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the periodic cleanup; it stops when the handle or the store is dropped
    pub fn start_cleanup(&self, every: Duration) -> SessionCleanupHandle {
        let table: Weak<SessionTable> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(table) = table.upgrade() else { break };
                let removed = purge(&table, Utc::now());
                if removed > 0 {
                    info!(removed = removed, "Expired admin sessions cleaned up");
                }
            }
        });
        SessionCleanupHandle { handle }
    }

    #[cfg(test)]
    fn insert_session(&self, token: &str, session: AdminSession) {
        self.inner.sessions.lock().insert(token.to_string(), session);
    }
}

fn purge(table: &SessionTable, now: DateTime<Utc>) -> usize {
    let mut sessions = table.sessions.lock();
    let before = sessions.len();
    sessions.retain(|_, s| !s.is_expired_at(now));
    before - sessions.len()
}

/// Owner of the cleanup task; aborts it on drop
#[derive(Debug)]
pub struct SessionCleanupHandle {
    handle: JoinHandle<()>,
}

impl SessionCleanupHandle {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SessionCleanupHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
