use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::version::VersionId;
use crate::domain::DomainError;

pub const MAX_COMMENT_BODY_LEN: usize = 4000;

/// Comment ID newtype
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CommentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A comment attached to a specific model version. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    id: CommentId,
    version_id: VersionId,
    author: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        version_id: VersionId,
        author: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let author = author.into();
        let body = body.into();

        if author.trim().is_empty() {
            return Err(DomainError::validation("Comment author cannot be empty"));
        }
        if body.trim().is_empty() {
            return Err(DomainError::validation("Comment body cannot be empty"));
        }
        if body.len() > MAX_COMMENT_BODY_LEN {
            return Err(DomainError::validation(format!(
                "Comment body cannot exceed {} characters",
                MAX_COMMENT_BODY_LEN
            )));
        }

        Ok(Self {
            id: CommentId::generate(),
            version_id,
            author,
            body,
            created_at: Utc::now(),
        })
    }

    /// Rebuild a comment from stored fields
    pub fn restore(
        id: CommentId,
        version_id: VersionId,
        author: String,
        body: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            version_id,
            author,
            body,
            created_at,
        }
    }

    pub fn id(&self) -> &CommentId {
        &self.id
    }

    pub fn version_id(&self) -> &VersionId {
        &self.version_id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
