use async_trait::async_trait;

use super::Comment;
use crate::domain::version::VersionId;
use crate::domain::DomainError;

/// Repository trait for Comment persistence
#[async_trait]
pub trait CommentRepository: Send + Sync + std::fmt::Debug {
    /// Persist a new comment
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError>;

    /// Comments for any of the given versions, oldest first
    async fn list_for_versions(
        &self,
        version_ids: &[VersionId],
    ) -> Result<Vec<Comment>, DomainError>;

    /// Hard-delete all comments of the given versions (cascade from upload
    /// deletion). Returns the number removed.
    async fn delete_for_versions(&self, version_ids: &[VersionId]) -> Result<u64, DomainError>;
}

/// In-memory implementation of CommentRepository
pub mod in_memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct InMemoryCommentRepository {
        comments: Mutex<HashMap<String, Comment>>,
    }

    impl InMemoryCommentRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl CommentRepository for InMemoryCommentRepository {
        async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
            self.comments
                .lock()
                .unwrap()
                .insert(comment.id().to_string(), comment.clone());
            Ok(comment)
        }

        async fn list_for_versions(
            &self,
            version_ids: &[VersionId],
        ) -> Result<Vec<Comment>, DomainError> {
            let mut comments: Vec<Comment> = self
                .comments
                .lock()
                .unwrap()
                .values()
                .filter(|c| version_ids.contains(c.version_id()))
                .cloned()
                .collect();
            comments.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
            Ok(comments)
        }

        async fn delete_for_versions(
            &self,
            version_ids: &[VersionId],
        ) -> Result<u64, DomainError> {
            let mut map = self.comments.lock().unwrap();
            let before = map.len();
            map.retain(|_, c| !version_ids.contains(c.version_id()));
            Ok((before - map.len()) as u64)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_list_filters_by_version_and_orders_oldest_first() {
            let repo = InMemoryCommentRepository::new();
            let v1 = VersionId::generate();
            let v2 = VersionId::generate();

            let first = Comment::new(v1.clone(), "alice", "first").unwrap();
            repo.create(first.clone()).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            let second = Comment::new(v1.clone(), "bob", "second").unwrap();
            repo.create(second.clone()).await.unwrap();
            repo.create(Comment::new(v2.clone(), "carol", "other").unwrap())
                .await
                .unwrap();

            let listed = repo.list_for_versions(&[v1.clone()]).await.unwrap();
            assert_eq!(listed.len(), 2);
            assert_eq!(listed[0].id(), first.id());
            assert_eq!(listed[1].id(), second.id());
        }

        #[tokio::test]
        async fn test_delete_for_versions_cascades() {
            let repo = InMemoryCommentRepository::new();
            let v1 = VersionId::generate();
            let v2 = VersionId::generate();
            repo.create(Comment::new(v1.clone(), "alice", "a").unwrap())
                .await
                .unwrap();
            repo.create(Comment::new(v1.clone(), "bob", "b").unwrap())
                .await
                .unwrap();
            repo.create(Comment::new(v2.clone(), "carol", "c").unwrap())
                .await
                .unwrap();

            let removed = repo.delete_for_versions(&[v1.clone()]).await.unwrap();
            assert_eq!(removed, 2);
            assert_eq!(repo.list_for_versions(&[v2]).await.unwrap().len(), 1);
        }
    }
}
