//! Event repository implementation
//!
//! Backed by the `events.json` catalog, read and rewritten through the record store.

use std::path::PathBuf;
use crate::database::record_store::{run_blocking, RecordStore};
use crate::models::event::{Event, EventCatalog};
use crate::utils::errors::{ClubError, Result};

#[derive(Debug, Clone)]
pub struct EventRepository {
    store: RecordStore,
    path: PathBuf,
}

impl EventRepository {
    pub fn new(store: RecordStore, path: PathBuf) -> Self {
        Self { store, path }
    }

    /// Load the whole catalog
    pub async fn catalog(&self) -> Result<EventCatalog> {
        let store = self.store.clone();
        let path = self.path.clone();
        run_blocking(move || Ok(store.read_document::<EventCatalog>(&path))).await
    }

    /// List all events
    pub async fn list(&self) -> Result<Vec<Event>> {
        Ok(self.catalog().await?.events)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>> {
        Ok(self.catalog().await?.find(id).cloned())
    }

    /// Find event whose slugified name equals `slug`
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        Ok(self.catalog().await?.find_by_slug(slug).cloned())
    }

    /// Create a new event; the id is taken from the catalog's counter
    ///
    /// Internal events with a template get their record file bound up-front.
    pub async fn create(&self, mut event: Event) -> Result<Event> {
        self.modify(move |catalog| {
            event.id = catalog.allocate_id();
            if event.accepts_internal_registration() && event.template_id.is_some() {
                event.registration_file = Some(event.registration_filename());
            }
            catalog.events.push(event.clone());
            Ok(event)
        })
        .await
    }

    /// Apply `f` to one event and persist the catalog
    pub async fn update<F>(&self, id: i64, f: F) -> Result<Event>
    where
        F: FnOnce(&mut Event) -> Result<()> + Send + 'static,
    {
        self.modify(move |catalog| {
            let event = catalog
                .find_mut(id)
                .ok_or_else(|| ClubError::NotFound("Event not found".to_string()))?;
            f(event)?;
            Ok(event.clone())
        })
        .await
    }

    /// Record file an event uses, without binding it
    pub async fn registration_file_of(&self, id: i64) -> Result<String> {
        let event = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ClubError::NotFound("Event not found".to_string()))?;
        Ok(event.bound_file_name().unwrap_or_else(|| event.registration_filename()))
    }

    /// Bind the event to its record file if it has none yet; returns the file name
    ///
    /// The catalog is only rewritten when the binding is new.
    pub async fn bind_registration_file(&self, id: i64) -> Result<String> {
        let event = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ClubError::NotFound("Event not found".to_string()))?;
        if let Some(existing) = event.bound_file_name() {
            return Ok(existing);
        }

        self.modify(move |catalog| {
            let event = catalog
                .find_mut(id)
                .ok_or_else(|| ClubError::NotFound("Event not found".to_string()))?;
            if let Some(existing) = event.bound_file_name() {
                return Ok(existing);
            }
            let file = event.registration_filename();
            event.registration_file = Some(file.clone());
            Ok(file)
        })
        .await
    }

    async fn modify<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut EventCatalog) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.store.clone();
        let path = self.path.clone();
        run_blocking(move || store.modify(&path, f)).await
    }
}
