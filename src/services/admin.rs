//! Event and form template administration
//!
//! Admin-side mutations of the two catalogs. Updates are JSON merge patches:
//! present keys replace, `null` removes, the identifier and the bound record
//! file are never taken from the patch.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use crate::database::DatabaseService;
use crate::models::{Event, FormTemplate, Registration};
use crate::utils::errors::{ClubError, Result, ValidationError};
use crate::utils::helpers::is_blank;
use crate::utils::logging::log_admin_action;

const EVENT_PROTECTED: &[&str] = &["id", "registration_file"];
const TEMPLATE_PROTECTED: &[&str] = &["id"];

/// One event's registrations as shown in the admin panel
#[derive(Debug, Clone)]
pub struct EventRegistrations {
    pub event: Event,
    pub registrations: Vec<Registration>,
    pub form_template: Option<FormTemplate>,
}

#[derive(Clone, Debug)]
pub struct AdminService {
    db: DatabaseService,
}

impl AdminService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        self.db.events.list().await
    }

    pub async fn create_event(&self, admin: &str, mut payload: Map<String, Value>) -> Result<Event> {
        payload.insert("id".to_string(), Value::from(0));
        payload.remove("registration_file");
        let event: Event = from_payload(Value::Object(payload))?;
        check_event(&event)?;

        let created = self.db.events.create(event).await?;
        log_admin_action(admin, "create_event", Some(&created.id.to_string()), Some(&created.name));
        Ok(created)
    }

    pub async fn update_event(&self, admin: &str, id: i64, patch: Map<String, Value>) -> Result<Event> {
        let updated = self
            .db
            .events
            .update(id, move |event| {
                let mut merged: Event = merge_patch(event, patch, EVENT_PROTECTED)?;
                check_event(&merged)?;
                if merged.accepts_internal_registration()
                    && merged.template_id.is_some()
                    && merged.bound_file_name().is_none()
                {
                    merged.registration_file = Some(merged.registration_filename());
                }
                *event = merged;
                Ok(())
            })
            .await?;
        log_admin_action(admin, "update_event", Some(&id.to_string()), None);
        Ok(updated)
    }

    /// Archive instead of delete; registrations stay on disk
    pub async fn archive_event(&self, admin: &str, id: i64) -> Result<Event> {
        let archived = self
            .db
            .events
            .update(id, |event| {
                event.archive();
                Ok(())
            })
            .await?;
        log_admin_action(admin, "archive_event", Some(&id.to_string()), None);
        Ok(archived)
    }

    /// Flip the registration gate; returns the new value
    pub async fn toggle_registration(&self, admin: &str, id: i64) -> Result<bool> {
        let event = self
            .db
            .events
            .update(id, |event| {
                event.allow_registration = !event.allow_registration;
                Ok(())
            })
            .await?;
        log_admin_action(
            admin,
            "toggle_registration",
            Some(&id.to_string()),
            Some(if event.allow_registration { "open" } else { "closed" }),
        );
        Ok(event.allow_registration)
    }

    pub async fn event_registrations(&self, id: i64) -> Result<EventRegistrations> {
        let (event, form_template) = self.db.event_with_template(id).await?;
        let registrations = self.db.registrations_for(&event).await?;
        Ok(EventRegistrations {
            event,
            registrations,
            form_template,
        })
    }

    pub async fn list_templates(&self) -> Result<Vec<FormTemplate>> {
        self.db.form_templates.list().await
    }

    pub async fn create_template(&self, admin: &str, mut payload: Map<String, Value>) -> Result<FormTemplate> {
        payload.insert("id".to_string(), Value::from(0));
        let template: FormTemplate = from_payload(Value::Object(payload))?;
        check_template(&template)?;

        let created = self.db.form_templates.create(template).await?;
        log_admin_action(admin, "create_template", Some(&created.id.to_string()), Some(&created.name));
        Ok(created)
    }

    pub async fn update_template(&self, admin: &str, id: i64, patch: Map<String, Value>) -> Result<FormTemplate> {
        let updated = self
            .db
            .form_templates
            .update(id, move |template| {
                let merged: FormTemplate = merge_patch(template, patch, TEMPLATE_PROTECTED)?;
                check_template(&merged)?;
                *template = merged;
                Ok(())
            })
            .await?;
        log_admin_action(admin, "update_template", Some(&id.to_string()), None);
        Ok(updated)
    }

    pub async fn delete_template(&self, admin: &str, id: i64) -> Result<()> {
        if !self.db.form_templates.delete(id).await? {
            return Err(ClubError::NotFound("Template not found".to_string()));
        }
        log_admin_action(admin, "delete_template", Some(&id.to_string()), None);
        Ok(())
    }

    /// Flip a template's `active` flag; returns the new value
    pub async fn toggle_template(&self, admin: &str, id: i64) -> Result<bool> {
        let template = self
            .db
            .form_templates
            .update(id, |template| {
                template.active = !template.active;
                Ok(())
            })
            .await?;
        log_admin_action(admin, "toggle_template", Some(&id.to_string()), None);
        Ok(template.active)
    }
}

fn from_payload<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ValidationError::Invalid(format!("Invalid payload: {}", e)).into())
}

/// Apply an RFC 7386 style merge patch to `target`
fn merge_patch<T>(target: &T, patch: Map<String, Value>, protected: &[&str]) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(target)?;
    if let Value::Object(object) = &mut value {
        for (key, new) in patch {
            if protected.contains(&key.as_str()) {
                continue;
            }
            if new.is_null() {
                object.remove(&key);
            } else {
                object.insert(key, new);
            }
        }
    }
    from_payload(value)
}

fn check_event(event: &Event) -> Result<()> {
    if is_blank(&event.name) {
        return Err(ValidationError::Invalid("Event name is required".to_string()).into());
    }
    Ok(())
}

fn check_template(template: &FormTemplate) -> Result<()> {
    if is_blank(&template.name) {
        return Err(ValidationError::Invalid("Template name is required".to_string()).into());
    }
    if template.min_participants == 0 || template.max_participants < template.min_participants {
        return Err(ValidationError::Invalid("Invalid participant limits".to_string()).into());
    }
    if !template.payment_amount.is_finite() || template.payment_amount < 0.0 {
        return Err(ValidationError::Invalid("Invalid payment amount".to_string()).into());
    }
    Ok(())
}
