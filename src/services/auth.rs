//! Authentication service implementation
//!
//! Admin panel login against the configured credentials and token
//! verification through the session store.

use constant_time_eq::constant_time_eq;
use tracing::{info, warn};
use crate::config::settings::Settings;
use crate::state::sessions::{AdminSession, AdminSessionStore};
use crate::utils::errors::{ClubError, Result};

/// Authentication service for the admin panel
#[derive(Clone, Debug)]
pub struct AuthService {
    username: String,
    password: String,
    sessions: AdminSessionStore,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(settings: &Settings, sessions: AdminSessionStore) -> Self {
        Self {
            username: settings.admin.username.clone(),
            password: settings.admin.password.clone(),
            sessions,
        }
    }

    pub fn sessions(&self) -> &AdminSessionStore {
        &self.sessions
    }

    /// Check credentials and issue a token
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        // both comparisons always run
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());

        if !(user_ok & pass_ok) || self.password.is_empty() {
            warn!(username = %username, "Admin login rejected");
            return Err(ClubError::Unauthorized("Invalid credentials".to_string()));
        }

        info!(username = %username, "Admin logged in");
        Ok(self.sessions.create(username))
    }

    /// Session behind a bearer token
    pub fn verify(&self, token: &str) -> Option<AdminSession> {
        self.sessions.get(token)
    }

    pub fn logout(&self, token: &str) -> bool {
        self.sessions.remove(token)
    }
}
