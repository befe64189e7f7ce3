//! ModelUpload repository trait

use async_trait::async_trait;

use super::{ModelUpload, UploadId};
use crate::domain::DomainError;

/// Repository trait for ModelUpload persistence
#[async_trait]
pub trait UploadRepository: Send + Sync + std::fmt::Debug {
    /// Get an upload by ID
    async fn get(&self, id: &UploadId) -> Result<Option<ModelUpload>, DomainError>;

    /// List all uploads, newest first
    async fn list(&self) -> Result<Vec<ModelUpload>, DomainError>;

    /// List uploads belonging to one owner, newest first
    async fn list_for_owner(&self, owner: &str) -> Result<Vec<ModelUpload>, DomainError>;

    /// Look up an upload by its unique (owner, name) pair
    async fn find_by_owner_and_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<ModelUpload>, DomainError>;

    /// Persist a new upload
    async fn create(&self, upload: ModelUpload) -> Result<ModelUpload, DomainError>;

    /// Hard-delete an upload; returns whether a row was removed
    async fn delete(&self, id: &UploadId) -> Result<bool, DomainError>;
}

/// In-memory implementation of UploadRepository
pub mod in_memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory implementation for testing and single-node development
    #[derive(Debug, Default)]
    pub struct InMemoryUploadRepository {
        uploads: Mutex<HashMap<String, ModelUpload>>,
    }

    impl InMemoryUploadRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_upload(self, upload: ModelUpload) -> Self {
            self.uploads
                .lock()
                .unwrap()
                .insert(upload.id().to_string(), upload);
            self
        }
    }

    #[async_trait]
    impl UploadRepository for InMemoryUploadRepository {
        async fn get(&self, id: &UploadId) -> Result<Option<ModelUpload>, DomainError> {
            Ok(self.uploads.lock().unwrap().get(id.as_str()).cloned())
        }

        async fn list(&self) -> Result<Vec<ModelUpload>, DomainError> {
            let mut uploads: Vec<ModelUpload> =
                self.uploads.lock().unwrap().values().cloned().collect();
            uploads.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
            Ok(uploads)
        }

        async fn list_for_owner(&self, owner: &str) -> Result<Vec<ModelUpload>, DomainError> {
            let mut uploads: Vec<ModelUpload> = self
                .uploads
                .lock()
                .unwrap()
                .values()
                .filter(|u| u.owner() == owner)
                .cloned()
                .collect();
            uploads.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
            Ok(uploads)
        }

        async fn find_by_owner_and_name(
            &self,
            owner: &str,
            name: &str,
        ) -> Result<Option<ModelUpload>, DomainError> {
            Ok(self
                .uploads
                .lock()
                .unwrap()
                .values()
                .find(|u| u.owner() == owner && u.name() == name)
                .cloned())
        }

        async fn create(&self, upload: ModelUpload) -> Result<ModelUpload, DomainError> {
            let id = upload.id().to_string();
            let mut map = self.uploads.lock().unwrap();

            if map.contains_key(&id) {
                return Err(DomainError::conflict(format!(
                    "ModelUpload with ID '{}' already exists",
                    id
                )));
            }

            map.insert(id, upload.clone());
            Ok(upload)
        }

        async fn delete(&self, id: &UploadId) -> Result<bool, DomainError> {
            Ok(self.uploads.lock().unwrap().remove(id.as_str()).is_some())
        }
    }

}
