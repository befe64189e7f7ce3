//! Version registry repository trait
//!
//! The repository owns the atomicity of the activation swap: setting one
//! version active and clearing every sibling must be a single step so the
//! at-most-one-active invariant holds under concurrent requests.

use async_trait::async_trait;
use chrono::Utc;

use super::{ModelVersion, VersionId};
use crate::domain::upload::UploadId;
use crate::domain::DomainError;

/// Repository trait for ModelVersion persistence and lifecycle transitions
#[async_trait]
pub trait VersionRepository: Send + Sync + std::fmt::Debug {
    /// Get a version by ID
    async fn get(&self, id: &VersionId) -> Result<Option<ModelVersion>, DomainError>;

    /// Persist a new (pending) version
    async fn create(&self, version: ModelVersion) -> Result<ModelVersion, DomainError>;

    /// Record the validation outcome; fails with InvalidState on a
    /// non-pending version and never overwrites an existing log.
    async fn record_validation(
        &self,
        id: &VersionId,
        passed: bool,
        log: &str,
    ) -> Result<ModelVersion, DomainError>;

    /// Atomically activate this version and deactivate every other version
    /// of the same upload. Requires a passed, non-deleted version.
    async fn activate(&self, id: &VersionId) -> Result<ModelVersion, DomainError>;

    /// Clear the active flag on this version
    async fn deactivate(&self, id: &VersionId) -> Result<ModelVersion, DomainError>;

    /// Soft-delete: hide and force-deactivate, keeping the row for audit.
    /// Idempotent; `deleted_at` is untouched on repeat calls.
    async fn soft_delete(&self, id: &VersionId) -> Result<ModelVersion, DomainError>;

    /// The single active version of an upload, if any
    async fn active_for_upload(
        &self,
        upload_id: &UploadId,
    ) -> Result<Option<ModelVersion>, DomainError>;

    /// Versions of an upload ordered by `created_at` descending. Soft-deleted
    /// versions are excluded unless `include_deleted` is set.
    async fn list_for_upload(
        &self,
        upload_id: &UploadId,
        include_deleted: bool,
    ) -> Result<Vec<ModelVersion>, DomainError>;

    /// Number of non-deleted versions under an upload
    async fn count_non_deleted(&self, upload_id: &UploadId) -> Result<usize, DomainError>;

    /// Hard-delete all versions of an upload (cascade from upload deletion)
    async fn delete_for_upload(&self, upload_id: &UploadId) -> Result<u64, DomainError>;
}

/// In-memory implementation of VersionRepository
pub mod in_memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory registry. All transitions run under one mutex guard, which
    /// makes the activation swap trivially atomic.
    #[derive(Debug, Default)]
    pub struct InMemoryVersionRepository {
        versions: Mutex<HashMap<String, ModelVersion>>,
    }

    impl InMemoryVersionRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    fn not_found(id: &VersionId) -> DomainError {
        DomainError::not_found(format!("ModelVersion '{}' not found", id))
    }

    #[async_trait]
    impl VersionRepository for InMemoryVersionRepository {
        async fn get(&self, id: &VersionId) -> Result<Option<ModelVersion>, DomainError> {
            Ok(self.versions.lock().unwrap().get(id.as_str()).cloned())
        }

        async fn create(&self, version: ModelVersion) -> Result<ModelVersion, DomainError> {
            let id = version.id().to_string();
            let mut map = self.versions.lock().unwrap();

            if map.contains_key(&id) {
                return Err(DomainError::conflict(format!(
                    "ModelVersion with ID '{}' already exists",
                    id
                )));
            }

            map.insert(id, version.clone());
            Ok(version)
        }

        async fn record_validation(
            &self,
            id: &VersionId,
            passed: bool,
            log: &str,
        ) -> Result<ModelVersion, DomainError> {
            let mut map = self.versions.lock().unwrap();
            let version = map.get_mut(id.as_str()).ok_or_else(|| not_found(id))?;
            version.record_validation(passed, log)?;
            Ok(version.clone())
        }

        async fn activate(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
            let mut map = self.versions.lock().unwrap();

            // Check the target before touching any sibling so a failed
            // activation leaves prior active state unchanged.
            {
                let target = map.get_mut(id.as_str()).ok_or_else(|| not_found(id))?;
                target.mark_active()?;
            }

            let upload_id = map
                .get(id.as_str())
                .map(|v| v.upload_id().clone())
                .ok_or_else(|| not_found(id))?;

            for version in map.values_mut() {
                if version.upload_id() == &upload_id && version.id() != id {
                    version.mark_inactive();
                }
            }

            Ok(map.get(id.as_str()).cloned().ok_or_else(|| not_found(id))?)
        }

        async fn deactivate(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
            let mut map = self.versions.lock().unwrap();
            let version = map.get_mut(id.as_str()).ok_or_else(|| not_found(id))?;
            if version.is_deleted() {
                return Err(DomainError::invalid_state(format!(
                    "cannot deactivate deleted version '{}'",
                    id
                )));
            }
            version.mark_inactive();
            Ok(version.clone())
        }

        async fn soft_delete(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
            let mut map = self.versions.lock().unwrap();
            let version = map.get_mut(id.as_str()).ok_or_else(|| not_found(id))?;
            version.mark_deleted(Utc::now());
            Ok(version.clone())
        }

        async fn active_for_upload(
            &self,
            upload_id: &UploadId,
        ) -> Result<Option<ModelVersion>, DomainError> {
            Ok(self
                .versions
                .lock()
                .unwrap()
                .values()
                .find(|v| v.upload_id() == upload_id && v.is_active() && v.is_available())
                .cloned())
        }

        async fn list_for_upload(
            &self,
            upload_id: &UploadId,
            include_deleted: bool,
        ) -> Result<Vec<ModelVersion>, DomainError> {
            let mut versions: Vec<ModelVersion> = self
                .versions
                .lock()
                .unwrap()
                .values()
                .filter(|v| v.upload_id() == upload_id)
                .filter(|v| include_deleted || !v.is_deleted())
                .cloned()
                .collect();
            versions.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
            Ok(versions)
        }

        async fn count_non_deleted(&self, upload_id: &UploadId) -> Result<usize, DomainError> {
            Ok(self
                .versions
                .lock()
                .unwrap()
                .values()
                .filter(|v| v.upload_id() == upload_id && !v.is_deleted())
                .count())
        }

        async fn delete_for_upload(&self, upload_id: &UploadId) -> Result<u64, DomainError> {
            let mut map = self.versions.lock().unwrap();
            let before = map.len();
            map.retain(|_, v| v.upload_id() != upload_id);
            Ok((before - map.len()) as u64)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        async fn seed_version(
            repo: &InMemoryVersionRepository,
            upload_id: &UploadId,
            tag: &str,
        ) -> ModelVersion {
            let version = ModelVersion::new(
                VersionId::generate(),
                upload_id.clone(),
                tag,
                format!("artifacts/{}/model.bin", tag),
                format!("artifacts/{}/predict.py", tag),
                None,
                format!("digest-{}", tag),
            )
            .unwrap();
            repo.create(version).await.unwrap()
        }

        async fn seed_passed(
            repo: &InMemoryVersionRepository,
            upload_id: &UploadId,
            tag: &str,
        ) -> ModelVersion {
            let version = seed_version(repo, upload_id, tag).await;
            repo.record_validation(version.id(), true, "ok")
                .await
                .unwrap()
        }

        async fn active_count(repo: &InMemoryVersionRepository, upload_id: &UploadId) -> usize {
            repo.list_for_upload(upload_id, false)
                .await
                .unwrap()
                .iter()
                .filter(|v| v.is_active())
                .count()
        }

        #[tokio::test]
        async fn test_activation_swap_keeps_single_active() {
            let repo = InMemoryVersionRepository::new();
            let upload_id = UploadId::generate();
            let a = seed_passed(&repo, &upload_id, "a").await;
            let b = seed_passed(&repo, &upload_id, "b").await;

            repo.activate(a.id()).await.unwrap();
            assert_eq!(active_count(&repo, &upload_id).await, 1);

            repo.activate(b.id()).await.unwrap();
            assert_eq!(active_count(&repo, &upload_id).await, 1);
            assert!(repo.get(b.id()).await.unwrap().unwrap().is_active());
            assert!(!repo.get(a.id()).await.unwrap().unwrap().is_active());
        }

        #[tokio::test]
        async fn test_activate_failed_version_leaves_active_untouched() {
            let repo = InMemoryVersionRepository::new();
            let upload_id = UploadId::generate();
            let a = seed_passed(&repo, &upload_id, "a").await;
            let b = seed_version(&repo, &upload_id, "b").await;
            repo.record_validation(b.id(), false, "shape mismatch")
                .await
                .unwrap();

            repo.activate(a.id()).await.unwrap();
            let result = repo.activate(b.id()).await;
            assert!(matches!(result, Err(DomainError::InvalidState { .. })));

            // A is still the active version
            let active = repo.active_for_upload(&upload_id).await.unwrap().unwrap();
            assert_eq!(active.id(), a.id());
        }

        #[tokio::test]
        async fn test_activation_does_not_cross_uploads() {
            let repo = InMemoryVersionRepository::new();
            let upload_a = UploadId::generate();
            let upload_b = UploadId::generate();
            let a = seed_passed(&repo, &upload_a, "a").await;
            let b = seed_passed(&repo, &upload_b, "b").await;

            repo.activate(a.id()).await.unwrap();
            repo.activate(b.id()).await.unwrap();

            assert!(repo.get(a.id()).await.unwrap().unwrap().is_active());
            assert!(repo.get(b.id()).await.unwrap().unwrap().is_active());
        }

        #[tokio::test]
        async fn test_soft_delete_active_version_leaves_none_active() {
            let repo = InMemoryVersionRepository::new();
            let upload_id = UploadId::generate();
            let a = seed_passed(&repo, &upload_id, "a").await;
            repo.activate(a.id()).await.unwrap();

            repo.soft_delete(a.id()).await.unwrap();

            assert!(repo.active_for_upload(&upload_id).await.unwrap().is_none());
            assert_eq!(active_count(&repo, &upload_id).await, 0);
        }

        #[tokio::test]
        async fn test_soft_delete_idempotent() {
            let repo = InMemoryVersionRepository::new();
            let upload_id = UploadId::generate();
            let a = seed_passed(&repo, &upload_id, "a").await;

            let first = repo.soft_delete(a.id()).await.unwrap();
            let stamp = first.deleted_at().unwrap();
            let second = repo.soft_delete(a.id()).await.unwrap();

            assert!(second.is_deleted());
            assert_eq!(second.deleted_at().unwrap(), stamp);
        }

        #[tokio::test]
        async fn test_soft_delete_unknown_is_not_found() {
            let repo = InMemoryVersionRepository::new();
            let result = repo.soft_delete(&VersionId::generate()).await;
            assert!(matches!(result, Err(DomainError::NotFound { .. })));
        }

        #[tokio::test]
        async fn test_record_validation_twice_keeps_first_log() {
            let repo = InMemoryVersionRepository::new();
            let upload_id = UploadId::generate();
            let version = seed_version(&repo, &upload_id, "a").await;

            repo.record_validation(version.id(), true, "first")
                .await
                .unwrap();
            let second = repo.record_validation(version.id(), false, "second").await;
            assert!(matches!(second, Err(DomainError::InvalidState { .. })));

            let stored = repo.get(version.id()).await.unwrap().unwrap();
            assert_eq!(stored.log(), Some("first"));
        }

        #[tokio::test]
        async fn test_listing_excludes_deleted_and_orders_newest_first() {
            let repo = InMemoryVersionRepository::new();
            let upload_id = UploadId::generate();
            let a = seed_passed(&repo, &upload_id, "a").await;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            let b = seed_passed(&repo, &upload_id, "b").await;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            let c = seed_passed(&repo, &upload_id, "c").await;
            repo.soft_delete(b.id()).await.unwrap();

            let listed = repo.list_for_upload(&upload_id, false).await.unwrap();
            let ids: Vec<&VersionId> = listed.iter().map(|v| v.id()).collect();
            assert_eq!(ids, vec![c.id(), a.id()]);

            let with_deleted = repo.list_for_upload(&upload_id, true).await.unwrap();
            assert_eq!(with_deleted.len(), 3);
        }

        #[tokio::test]
        async fn test_concurrent_activation_settles_to_one_winner() {
            use std::sync::Arc;

            let repo = Arc::new(InMemoryVersionRepository::new());
            let upload_id = UploadId::generate();
            let a = seed_passed(&repo, &upload_id, "a").await;
            let b = seed_passed(&repo, &upload_id, "b").await;

            let mut handles = Vec::new();
            for id in [a.id().clone(), b.id().clone()] {
                let repo = repo.clone();
                handles.push(tokio::spawn(async move { repo.activate(&id).await }));
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            assert_eq!(active_count(&repo, &upload_id).await, 1);
        }
    }
}
