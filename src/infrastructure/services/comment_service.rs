//! Comments with real-time fan-out
//!
//! A comment attaches to the model's currently active version. The write
//! is the source of truth: the comment is persisted first and only then
//! broadcast, and a fan-out failure is logged and swallowed.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::broadcast::{CommentBroadcaster, CommentEvent, EventStream, Topic};
use crate::domain::comment::{Comment, CommentRepository};
use crate::domain::upload::{UploadId, UploadRepository};
use crate::domain::version::{VersionId, VersionRepository};
use crate::domain::DomainError;

/// Service for posting, listing and streaming comments
#[derive(Debug)]
pub struct CommentService {
    uploads: Arc<dyn UploadRepository>,
    versions: Arc<dyn VersionRepository>,
    comments: Arc<dyn CommentRepository>,
    broadcaster: Arc<dyn CommentBroadcaster>,
}

impl CommentService {
    pub fn new(
        uploads: Arc<dyn UploadRepository>,
        versions: Arc<dyn VersionRepository>,
        comments: Arc<dyn CommentRepository>,
        broadcaster: Arc<dyn CommentBroadcaster>,
    ) -> Self {
        Self {
            uploads,
            versions,
            comments,
            broadcaster,
        }
    }

    async fn ensure_upload(&self, upload_id: &UploadId) -> Result<(), DomainError> {
        self.uploads
            .get(upload_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(format!("ModelUpload '{}' not found", upload_id)))
    }

    /// Post a comment on the model's active version
    pub async fn create(
        &self,
        upload_id: &UploadId,
        author: &str,
        body: &str,
    ) -> Result<Comment, DomainError> {
        self.ensure_upload(upload_id).await?;

        let active = self
            .versions
            .active_for_upload(upload_id)
            .await?
            .ok_or_else(|| {
                DomainError::no_active_version(format!(
                    "Model '{}' has no active version to comment on",
                    upload_id
                ))
            })?;

        let comment = self
            .comments
            .create(Comment::new(active.id().clone(), author, body)?)
            .await?;

        let topic = Topic::for_upload(upload_id);
        let event = CommentEvent::Created {
            comment: comment.clone(),
        };
        if let Err(e) = self.broadcaster.publish(&topic, event).await {
            warn!(topic = %topic, error = %e, "Comment fan-out failed; comment is persisted");
        }

        info!(comment_id = %comment.id(), upload_id = %upload_id, "Comment posted");
        Ok(comment)
    }

    /// All comments under a model, across its non-deleted versions,
    /// oldest first
    pub async fn list(&self, upload_id: &UploadId) -> Result<Vec<Comment>, DomainError> {
        self.ensure_upload(upload_id).await?;

        let version_ids: Vec<VersionId> = self
            .versions
            .list_for_upload(upload_id, false)
            .await?
            .into_iter()
            .map(|v| v.id().clone())
            .collect();

        self.comments.list_for_versions(&version_ids).await
    }

    /// Open a live event stream for the model's comment topic
    pub async fn subscribe(&self, upload_id: &UploadId) -> Result<EventStream, DomainError> {
        self.ensure_upload(upload_id).await?;
        self.broadcaster.subscribe(&Topic::for_upload(upload_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    use crate::domain::broadcast::mock::FailingBroadcaster;
    use crate::domain::comment::InMemoryCommentRepository;
    use crate::domain::upload::{InMemoryUploadRepository, ModelUpload};
    use crate::domain::version::{InMemoryVersionRepository, ModelVersion};
    use crate::infrastructure::broadcast::InMemoryBroadcaster;

    struct Fixture {
        service: CommentService,
        comments: Arc<InMemoryCommentRepository>,
        versions: Arc<InMemoryVersionRepository>,
        upload_id: UploadId,
    }

    async fn fixture(broadcaster: Arc<dyn CommentBroadcaster>) -> Fixture {
        let uploads = Arc::new(InMemoryUploadRepository::new());
        let upload = uploads
            .create(ModelUpload::new("alice", "sentiment").unwrap())
            .await
            .unwrap();
        let versions = Arc::new(InMemoryVersionRepository::new());
        let comments = Arc::new(InMemoryCommentRepository::new());
        Fixture {
            service: CommentService::new(
                uploads,
                versions.clone(),
                comments.clone(),
                broadcaster,
            ),
            comments,
            versions,
            upload_id: upload.id().clone(),
        }
    }

    async fn activate_version(fx: &Fixture) -> ModelVersion {
        let version = ModelVersion::new(
            VersionId::generate(),
            fx.upload_id.clone(),
            "v1",
            "a-ref",
            "s-ref",
            None,
            "digest",
        )
        .unwrap();
        let version = fx.versions.create(version).await.unwrap();
        fx.versions
            .record_validation(version.id(), true, "ok")
            .await
            .unwrap();
        fx.versions.activate(version.id()).await.unwrap()
    }

    #[tokio::test]
    async fn test_comment_attaches_to_active_version_and_fans_out() {
        let fx = fixture(Arc::new(InMemoryBroadcaster::default())).await;
        let version = activate_version(&fx).await;

        let mut stream = fx.service.subscribe(&fx.upload_id).await.unwrap();
        let comment = fx
            .service
            .create(&fx.upload_id, "bob", "ship it")
            .await
            .unwrap();

        assert_eq!(comment.version_id(), version.id());
        let CommentEvent::Created { comment: received } = stream.next().await.unwrap();
        assert_eq!(received.id(), comment.id());
    }

    #[tokio::test]
    async fn test_comment_without_active_version() {
        let fx = fixture(Arc::new(InMemoryBroadcaster::default())).await;
        let result = fx.service.create(&fx.upload_id, "bob", "hello").await;
        assert!(matches!(result, Err(DomainError::NoActiveVersion { .. })));
    }

    #[tokio::test]
    async fn test_comment_persists_with_zero_subscribers() {
        let fx = fixture(Arc::new(InMemoryBroadcaster::default())).await;
        activate_version(&fx).await;

        fx.service
            .create(&fx.upload_id, "bob", "nobody listening")
            .await
            .unwrap();

        let listed = fx.service.list(&fx.upload_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].body(), "nobody listening");
    }

    #[tokio::test]
    async fn test_broadcast_failure_does_not_lose_comment() {
        let fx = fixture(Arc::new(FailingBroadcaster)).await;
        let version = activate_version(&fx).await;

        let comment = fx
            .service
            .create(&fx.upload_id, "bob", "still here")
            .await
            .unwrap();

        let stored = fx
            .comments
            .list_for_versions(&[version.id().clone()])
            .await
            .unwrap();
        assert_eq!(stored[0].id(), comment.id());
    }

    #[tokio::test]
    async fn test_empty_body_rejected_before_persisting() {
        let fx = fixture(Arc::new(InMemoryBroadcaster::default())).await;
        let version = activate_version(&fx).await;

        let result = fx.service.create(&fx.upload_id, "bob", "   ").await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert!(fx
            .comments
            .list_for_versions(&[version.id().clone()])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_spans_versions_but_hides_deleted_ones() {
        let fx = fixture(Arc::new(InMemoryBroadcaster::default())).await;
        let v1 = activate_version(&fx).await;
        fx.service.create(&fx.upload_id, "bob", "on v1").await.unwrap();

        // second version takes over, v1 gets soft-deleted
        let v2 = ModelVersion::new(
            VersionId::generate(),
            fx.upload_id.clone(),
            "v2",
            "a2",
            "s2",
            None,
            "digest-2",
        )
        .unwrap();
        let v2 = fx.versions.create(v2).await.unwrap();
        fx.versions.record_validation(v2.id(), true, "ok").await.unwrap();
        fx.versions.activate(v2.id()).await.unwrap();
        fx.service.create(&fx.upload_id, "bob", "on v2").await.unwrap();
        fx.versions.soft_delete(v1.id()).await.unwrap();

        let listed = fx.service.list(&fx.upload_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].body(), "on v2");
    }
}
