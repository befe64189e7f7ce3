//! Model upload management

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::artifact::ArtifactStore;
use crate::domain::comment::CommentRepository;
use crate::domain::upload::{ModelUpload, UploadId, UploadRepository};
use crate::domain::version::{VersionCounts, VersionId, VersionRepository};
use crate::domain::DomainError;

/// Service for managing model uploads
#[derive(Debug)]
pub struct UploadService {
    uploads: Arc<dyn UploadRepository>,
    versions: Arc<dyn VersionRepository>,
    comments: Arc<dyn CommentRepository>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl UploadService {
    pub fn new(
        uploads: Arc<dyn UploadRepository>,
        versions: Arc<dyn VersionRepository>,
        comments: Arc<dyn CommentRepository>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            uploads,
            versions,
            comments,
            artifacts,
        }
    }

    /// Register a new model. Owner and name together must be unique.
    pub async fn create(&self, owner: &str, name: &str) -> Result<ModelUpload, DomainError> {
        if self
            .uploads
            .find_by_owner_and_name(owner, name)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "Model '{}' already exists for owner '{}'",
                name, owner
            )));
        }

        let upload = self.uploads.create(ModelUpload::new(owner, name)?).await?;
        info!(upload_id = %upload.id(), owner, name, "Model registered");
        Ok(upload)
    }

    pub async fn get(&self, id: &UploadId) -> Result<ModelUpload, DomainError> {
        self.uploads
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("ModelUpload '{}' not found", id)))
    }

    /// All models with per-model version counts
    pub async fn list(&self) -> Result<Vec<(ModelUpload, VersionCounts)>, DomainError> {
        self.with_counts(self.uploads.list().await?).await
    }

    /// One owner's models with per-model version counts
    pub async fn list_for_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<(ModelUpload, VersionCounts)>, DomainError> {
        self.with_counts(self.uploads.list_for_owner(owner).await?)
            .await
    }

    async fn with_counts(
        &self,
        uploads: Vec<ModelUpload>,
    ) -> Result<Vec<(ModelUpload, VersionCounts)>, DomainError> {
        let mut result = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let versions = self.versions.list_for_upload(upload.id(), true).await?;
            result.push((upload, VersionCounts::from_versions(&versions)));
        }
        Ok(result)
    }

    /// Remove a model and everything under it. Refused while the model
    /// still has non-deleted versions; soft-delete those first.
    pub async fn delete(&self, id: &UploadId) -> Result<(), DomainError> {
        let upload = self.get(id).await?;

        let remaining = self.versions.count_non_deleted(id).await?;
        if remaining > 0 {
            return Err(DomainError::conflict(format!(
                "Model '{}' still has {} non-deleted version(s)",
                upload.name(),
                remaining
            )));
        }

        let version_ids: Vec<VersionId> = self
            .versions
            .list_for_upload(id, true)
            .await?
            .into_iter()
            .map(|v| v.id().clone())
            .collect();

        self.comments.delete_for_versions(&version_ids).await?;
        self.versions.delete_for_upload(id).await?;
        if let Err(e) = self.artifacts.delete_upload(id).await {
            warn!(upload_id = %id, error = %e, "Failed to remove artifact files");
        }
        self.uploads.delete(id).await?;

        info!(upload_id = %id, "Model deleted");
        Ok(())
    }
}
