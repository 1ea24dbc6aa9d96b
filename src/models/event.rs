//! Event model

use std::path::Path;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::utils::helpers::slugify;
use super::lenient;

fn default_true() -> bool {
    true
}

fn default_next_id() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub registration_type: RegistrationType,
    #[serde(default, deserialize_with = "lenient::opt_i64", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_deadline: Option<RegistrationDeadline>,
    #[serde(default = "default_true")]
    pub allow_registration: bool,
    /// Record store file name under the registrations directory, bound lazily
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_file: Option<String>,
    /// Presentation fields (description, location, rules, ...) kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    #[default]
    None,
    Internal,
    External,
}

/// Last day on which registration is accepted, or "TBA"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationDeadline {
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RegistrationDeadline {
    /// Closing date; `None` for "TBA", blank or unparseable dates
    pub fn closes_on(&self) -> Option<NaiveDate> {
        let date = self.date.trim();
        if date.is_empty() || date.eq_ignore_ascii_case("TBA") {
            return None;
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }

    /// The deadline day itself is still open
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.closes_on().map_or(true, |deadline| today <= deadline)
    }
}

impl Event {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// Deterministic record file name, unique across same-named events
    pub fn registration_filename(&self) -> String {
        format!("{}_{}_registrations.json", self.slug(), self.id)
    }

    /// File name used before files carried the event id
    pub fn legacy_registration_filename(&self) -> String {
        format!("{}_registrations.json", self.slug())
    }

    /// File name of the bound record file, tolerating older `data/registrations/...` paths
    pub fn bound_file_name(&self) -> Option<String> {
        self.registration_file
            .as_deref()
            .and_then(|f| Path::new(f).file_name())
            .and_then(|f| f.to_str())
            .map(str::to_string)
    }

    pub fn accepts_internal_registration(&self) -> bool {
        self.registration_type == RegistrationType::Internal
    }

    /// Archive instead of delete so historical registrations stay reachable
    pub fn archive(&mut self) {
        self.status = EventStatus::Completed;
        self.registration_type = RegistrationType::None;
        self.allow_registration = false;
    }
}

/// On-disk shape of `events.json`
///
/// Deserializes from both the current document and the older bare array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "EventCatalogFile")]
pub struct EventCatalog {
    pub next_id: i64,
    pub events: Vec<Event>,
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self {
            next_id: default_next_id(),
            events: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventCatalogFile {
    Legacy(Vec<Event>),
    Current {
        #[serde(default = "default_next_id")]
        next_id: i64,
        #[serde(default)]
        events: Vec<Event>,
    },
}

impl From<EventCatalogFile> for EventCatalog {
    fn from(file: EventCatalogFile) -> Self {
        let (next_id, events) = match file {
            EventCatalogFile::Legacy(events) => (default_next_id(), events),
            EventCatalogFile::Current { next_id, events } => (next_id, events),
        };
        let max_id = events.iter().map(|e| e.id).max().unwrap_or(0);
        EventCatalog {
            next_id: next_id.max(max_id + 1),
            events,
        }
    }
}

impl EventCatalog {
    pub fn find(&self, id: i64) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn find_mut(&mut self, id: i64) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.id == id)
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.slug() == slug)
    }

    /// Take the next identifier
    pub fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
