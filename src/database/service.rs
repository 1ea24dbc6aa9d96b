//! Database service layer
//!
//! This module provides a high-level interface to the JSON file storage

use std::path::PathBuf;
use tracing::info;
use crate::config::Settings;
use crate::database::{EventRepository, FormTemplateRepository, RecordStore, RegistrationRepository};
use crate::database::record_store::run_blocking;
use crate::models::*;
use crate::utils::errors::{ClubError, Result};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub events: EventRepository,
    pub form_templates: FormTemplateRepository,
    pub registrations: RegistrationRepository,
    store: RecordStore,
    data_dir: PathBuf,
}

impl DatabaseService {
    pub fn new(settings: &Settings) -> Self {
        let store = RecordStore::new(settings.storage.max_file_locks);
        Self {
            events: EventRepository::new(store.clone(), settings.events_path()),
            form_templates: FormTemplateRepository::new(store.clone(), settings.form_templates_path()),
            registrations: RegistrationRepository::new(store.clone(), settings.registrations_path()),
            store,
            data_dir: settings.storage.data_dir.clone(),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Create the data layout on first start
    pub async fn initialize(&self) -> Result<()> {
        let store = self.store.clone();
        let data_dir = self.data_dir.clone();
        let registrations_dir = self.registrations.dir().to_path_buf();

        run_blocking(move || {
            std::fs::create_dir_all(&registrations_dir)
                .map_err(|e| ClubError::Storage(format!("create {}: {}", registrations_dir.display(), e)))?;

            let events = data_dir.join("events.json");
            if !events.exists() {
                store.write(&events, &EventCatalog::default())?;
            }
            let templates = data_dir.join("form_templates.json");
            if !templates.exists() {
                store.write(&templates, &Vec::<FormTemplate>::new())?;
            }
            Ok(())
        })
        .await?;

        info!(data_dir = %self.data_dir.display(), "Storage initialized");
        Ok(())
    }

    /// Load an event together with the template it references
    pub async fn event_with_template(&self, event_id: i64) -> Result<(Event, Option<FormTemplate>)> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| ClubError::NotFound("Event not found".to_string()))?;

        let template = match event.template_id {
            Some(id) => self.form_templates.find_by_id(id).await?,
            None => None,
        };
        Ok((event, template))
    }

    /// Record file holding an event's registrations: the bound file, else the legacy name
    pub fn registration_file_for(&self, event: &Event) -> String {
        event
            .bound_file_name()
            .unwrap_or_else(|| event.legacy_registration_filename())
    }

    /// Registrations of one event
    pub async fn registrations_for(&self, event: &Event) -> Result<Vec<Registration>> {
        self.registrations.list(&self.registration_file_for(event)).await
    }
}
