//! Form template repository implementation

use std::path::PathBuf;
use crate::database::record_store::{run_blocking, RecordStore};
use crate::models::form_template::FormTemplate;
use crate::utils::errors::{ClubError, Result};

#[derive(Debug, Clone)]
pub struct FormTemplateRepository {
    store: RecordStore,
    path: PathBuf,
}

impl FormTemplateRepository {
    pub fn new(store: RecordStore, path: PathBuf) -> Self {
        Self { store, path }
    }

    /// List all templates
    pub async fn list(&self) -> Result<Vec<FormTemplate>> {
        let store = self.store.clone();
        let path = self.path.clone();
        run_blocking(move || Ok(store.read::<FormTemplate>(&path))).await
    }

    /// Find template by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<FormTemplate>> {
        Ok(self.list().await?.into_iter().find(|t| t.id == id))
    }

    /// Store a new template under `max(id) + 1`
    pub async fn create(&self, mut template: FormTemplate) -> Result<FormTemplate> {
        self.modify(move |templates| {
            template.id = templates.iter().map(|t| t.id).max().unwrap_or(0) + 1;
            templates.push(template.clone());
            Ok(template)
        })
        .await
    }

    /// Apply `f` to one template and persist
    pub async fn update<F>(&self, id: i64, f: F) -> Result<FormTemplate>
    where
        F: FnOnce(&mut FormTemplate) -> Result<()> + Send + 'static,
    {
        self.modify(move |templates| {
            let template = templates
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| ClubError::NotFound("Template not found".to_string()))?;
            f(template)?;
            template.id = id;
            Ok(template.clone())
        })
        .await
    }

    /// Remove a template; returns whether it existed
    pub async fn delete(&self, id: i64) -> Result<bool> {
        self.modify(move |templates| {
            let before = templates.len();
            templates.retain(|t| t.id != id);
            Ok(templates.len() != before)
        })
        .await
    }

    async fn modify<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<FormTemplate>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.store.clone();
        let path = self.path.clone();
        run_blocking(move || store.modify(&path, f)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn template(json: &str) -> FormTemplate {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_ids_follow_max() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("form_templates.json"), r#"[{"id": 7, "name": "Team"}]"#).unwrap();
        let repo = FormTemplateRepository::new(RecordStore::new(10), dir.path().join("form_templates.json"));

        let created = repo.create(template(r#"{"name": "Solo"}"#)).await.unwrap();
        assert_eq!(created.id, 8);

        assert!(repo.delete(7).await.unwrap());
        assert!(!repo.delete(7).await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_id() {
        let dir = TempDir::new().unwrap();
        let repo = FormTemplateRepository::new(RecordStore::new(10), dir.path().join("form_templates.json"));
        let created = repo.create(template(r#"{"name": "Solo"}"#)).await.unwrap();

        let updated = repo
            .update(created.id, |t| {
                t.active = false;
                t.id = 99;
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert!(!repo.find_by_id(created.id).await.unwrap().unwrap().active);
    }
}
