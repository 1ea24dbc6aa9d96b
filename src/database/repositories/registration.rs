//! Registration repository implementation
//!
//! One JSON list per event under the registrations directory. Files are named
//! by the caller; names carrying path components are refused.

use std::path::{Component, Path, PathBuf};
use crate::database::record_store::{run_blocking, AppendOutcome, RecordStore, Sequenced};
use crate::models::registration::Registration;
use crate::utils::errors::{ClubError, Result};

impl Sequenced for Registration {
    fn assign_sequence(&mut self, id: u64) {
        self.id = id;
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    store: RecordStore,
    dir: PathBuf,
}

impl RegistrationRepository {
    pub fn new(store: RecordStore, dir: PathBuf) -> Self {
        Self { store, dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a bare file name inside the registrations directory
    pub fn path_for(&self, file_name: &str) -> Result<PathBuf> {
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if file_name.ends_with(".json") => {
                Ok(self.dir.join(name))
            }
            _ => Err(ClubError::InvalidInput(format!("Invalid registration file: {}", file_name))),
        }
    }

    pub async fn exists(&self, file_name: &str) -> Result<bool> {
        Ok(self.path_for(file_name)?.exists())
    }

    /// Create an empty list file if none exists
    pub async fn ensure_file(&self, file_name: &str) -> Result<()> {
        let path = self.path_for(file_name)?;
        let store = self.store.clone();
        run_blocking(move || {
            if path.exists() {
                return Ok(());
            }
            store.write(&path, &Vec::<Registration>::new())
        })
        .await
    }

    /// All registrations of one file; unreadable files yield an empty list
    pub async fn list(&self, file_name: &str) -> Result<Vec<Registration>> {
        let path = self.path_for(file_name)?;
        let store = self.store.clone();
        run_blocking(move || Ok(store.read::<Registration>(&path))).await
    }

    /// Add one registration via the record store's single-lock append
    pub async fn append<F>(&self, file_name: &str, registration: Registration, check: F) -> Result<AppendOutcome<Registration>>
    where
        F: FnOnce(&[Registration], &Registration) -> Option<String> + Send + 'static,
    {
        let path = self.path_for(file_name)?;
        let store = self.store.clone();
        run_blocking(move || store.atomic_append(&path, registration, check)).await
    }

    /// Locked read-modify-write of one file
    pub async fn modify<R, F>(&self, file_name: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Registration>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let path = self.path_for(file_name)?;
        let store = self.store.clone();
        run_blocking(move || store.modify(&path, f)).await
    }

    /// Apply `f` to the first registration, in any file, whose payment order matches
    ///
    /// Linear scan over every record file; returns the updated record's credential.
    pub async fn update_by_order<F>(&self, order_id: &str, f: F) -> Result<Option<String>>
    where
        F: Fn(&mut Registration) + Send + Sync + 'static,
    {
        let store = self.store.clone();
        let dir = self.dir.clone();
        let order_id = order_id.to_string();

        run_blocking(move || {
            for path in store.list_files(&dir) {
                let records: Vec<Registration> = store.read(&path);
                if !records.iter().any(|r| r.payment_order_id.as_deref() == Some(order_id.as_str())) {
                    continue;
                }

                let updated = store.modify(&path, |records: &mut Vec<Registration>| {
                    let found = records
                        .iter_mut()
                        .find(|r| r.payment_order_id.as_deref() == Some(order_id.as_str()))
                        .ok_or_else(|| ClubError::NotFound("Registration not found".to_string()))?;
                    f(found);
                    Ok(found.registration_id.clone())
                });

                match updated {
                    Ok(credential) => return Ok(Some(credential)),
                    Err(ClubError::NotFound(_)) => continue,
                    Err(e) => return Err(e),
                }
            }
            Ok(None)
        })
        .await
    }
}
