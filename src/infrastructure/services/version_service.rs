//! Version lifecycle: upload, validation, activation, rollback, soft delete

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::artifact::{ArtifactStore, VersionArtifacts};
use crate::domain::upload::{UploadId, UploadRepository};
use crate::domain::validator::Validator;
use crate::domain::version::{ModelVersion, VersionId, VersionRepository};
use crate::domain::DomainError;

/// Service for managing model versions
#[derive(Debug)]
pub struct VersionService {
    uploads: Arc<dyn UploadRepository>,
    versions: Arc<dyn VersionRepository>,
    artifacts: Arc<dyn ArtifactStore>,
    validator: Arc<dyn Validator>,
}

impl VersionService {
    pub fn new(
        uploads: Arc<dyn UploadRepository>,
        versions: Arc<dyn VersionRepository>,
        artifacts: Arc<dyn ArtifactStore>,
        validator: Arc<dyn Validator>,
    ) -> Self {
        Self {
            uploads,
            versions,
            artifacts,
            validator,
        }
    }

    async fn ensure_upload(&self, upload_id: &UploadId) -> Result<(), DomainError> {
        self.uploads
            .get(upload_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(format!("ModelUpload '{}' not found", upload_id)))
    }

    /// Store a new version bundle and validate it once on CPU. The version
    /// always comes back with a recorded outcome; a failed smoke run is a
    /// normal result, not an error.
    pub async fn create_version(
        &self,
        upload_id: &UploadId,
        tag: &str,
        bundle: VersionArtifacts,
    ) -> Result<ModelVersion, DomainError> {
        self.ensure_upload(upload_id).await?;
        crate::domain::version::validate_version_tag(tag)?;

        let digest = bundle.digest();
        let existing = self.versions.list_for_upload(upload_id, false).await?;
        if let Some(duplicate) = existing.iter().find(|v| v.content_digest() == digest) {
            return Err(DomainError::conflict(format!(
                "Identical bundle already uploaded as version '{}'",
                duplicate.tag()
            )));
        }

        let version_id = VersionId::generate();
        let stored = self.artifacts.put(upload_id, &version_id, &bundle).await?;

        let version = ModelVersion::new(
            version_id.clone(),
            upload_id.clone(),
            tag,
            stored.artifact_ref,
            stored.script_ref,
            stored.schema_ref,
            digest,
        )?;
        let version = match self.versions.create(version).await {
            Ok(version) => version,
            Err(e) => {
                // don't strand blobs for a version that was never registered
                if let Err(cleanup) = self.artifacts.delete_version(upload_id, &version_id).await {
                    warn!(version_id = %version_id, error = %cleanup, "Failed to remove artifact files");
                }
                return Err(e);
            }
        };

        let report = self.validator.validate(&version).await;
        let version = self
            .versions
            .record_validation(version.id(), report.passed, &report.log)
            .await?;

        info!(
            version_id = %version.id(),
            upload_id = %upload_id,
            tag,
            status = %version.validation_status(),
            "Version uploaded and validated"
        );
        Ok(version)
    }

    pub async fn get(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
        self.versions
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("ModelVersion '{}' not found", id)))
    }

    pub async fn list_versions(
        &self,
        upload_id: &UploadId,
        include_deleted: bool,
    ) -> Result<Vec<ModelVersion>, DomainError> {
        self.ensure_upload(upload_id).await?;
        self.versions.list_for_upload(upload_id, include_deleted).await
    }

    pub async fn active_version(
        &self,
        upload_id: &UploadId,
    ) -> Result<Option<ModelVersion>, DomainError> {
        self.ensure_upload(upload_id).await?;
        self.versions.active_for_upload(upload_id).await
    }

    /// Make this version the serving one for its model
    pub async fn activate(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
        let version = self.versions.activate(id).await?;
        info!(version_id = %id, upload_id = %version.upload_id(), "Version activated");
        Ok(version)
    }

    /// Take the version out of serving without deleting it
    pub async fn deactivate(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
        let version = self.versions.deactivate(id).await?;
        info!(version_id = %id, "Version deactivated");
        Ok(version)
    }

    /// Activate an earlier version of the given model. The target must
    /// belong to that model; a foreign version id reads as not found.
    pub async fn rollback(
        &self,
        upload_id: &UploadId,
        target: &VersionId,
    ) -> Result<ModelVersion, DomainError> {
        self.ensure_upload(upload_id).await?;
        let version = self.get(target).await?;
        if version.upload_id() != upload_id {
            return Err(DomainError::not_found(format!(
                "ModelVersion '{}' not found for model '{}'",
                target, upload_id
            )));
        }

        let version = self.versions.activate(target).await?;
        info!(version_id = %target, upload_id = %upload_id, "Rolled back to version");
        Ok(version)
    }

    /// Hide a version. Its row and log stay for audit; its artifact files
    /// are removed best-effort.
    pub async fn soft_delete(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
        let version = self.versions.soft_delete(id).await?;

        if let Err(e) = self
            .artifacts
            .delete_version(version.upload_id(), version.id())
            .await
        {
            warn!(version_id = %id, error = %e, "Failed to remove artifact files");
        }

        info!(version_id = %id, "Version soft-deleted");
        Ok(version)
    }
}
