//! Application state shared by all HTTP handlers

use std::sync::Arc;
use std::time::Duration;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::services::ServiceFactory;
use super::sessions::SessionCleanupHandle;

/// Process-scoped state, built once at startup and cloned into handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: DatabaseService,
    pub services: ServiceFactory,
    session_cleanup: Option<Arc<SessionCleanupHandle>>,
}

impl AppState {
    pub fn new(settings: Settings, db: DatabaseService, services: ServiceFactory) -> Self {
        Self {
            settings: Arc::new(settings),
            db,
            services,
            session_cleanup: None,
        }
    }

    /// Start the periodic admin session cleanup; it ends with the last clone of this state
    pub fn with_session_cleanup(mut self) -> Self {
        let every = Duration::from_secs(self.settings.admin.cleanup_interval_seconds.max(1));
        let handle = self.services.auth_service.sessions().start_cleanup(every);
        self.session_cleanup = Some(Arc::new(handle));
        self
    }

    pub fn session_cleanup_running(&self) -> bool {
        self.session_cleanup.as_ref().map_or(false, |h| h.is_running())
    }
}
