//! ModelUpload entity - a logical, user-owned model slot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

pub const MAX_UPLOAD_NAME_LEN: usize = 200;

/// Identifier for a ModelUpload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(String);

impl UploadId {
    /// Generate a fresh random identifier
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

impl From<String> for UploadId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a model upload display name
pub fn validate_upload_name(name: &str) -> Result<(), DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("model name must not be empty"));
    }
    if trimmed.len() > MAX_UPLOAD_NAME_LEN {
        return Err(DomainError::validation(format!(
            "model name must be at most {} characters",
            MAX_UPLOAD_NAME_LEN
        )));
    }
    Ok(())
}

/// A logical model slot owned by one uploader. Versions hang off it and are
/// cascade-deleted with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUpload {
    id: UploadId,
    owner: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl ModelUpload {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, DomainError> {
        let owner = owner.into();
        let name = name.into();
        if owner.trim().is_empty() {
            return Err(DomainError::validation("owner must not be empty"));
        }
        validate_upload_name(&name)?;
        Ok(Self {
            id: UploadId::generate(),
            owner,
            name: name.trim().to_string(),
            created_at: Utc::now(),
        })
    }

    /// Rehydrate an upload from stored fields
    pub fn restore(
        id: UploadId,
        owner: String,
        name: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            name,
            created_at,
        }
    }

    pub fn id(&self) -> &UploadId {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_creation() {
        let upload = ModelUpload::new("alice", "sentiment-classifier").unwrap();
        assert_eq!(upload.owner(), "alice");
        assert_eq!(upload.name(), "sentiment-classifier");
        assert!(!upload.id().as_str().is_empty());
    }

    #[test]
    fn test_upload_name_trimmed() {
        let upload = ModelUpload::new("alice", "  spaced  ").unwrap();
        assert_eq!(upload.name(), "spaced");
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(ModelUpload::new("alice", "   ").is_err());
    }

    #[test]
    fn test_oversized_name_rejected() {
        let name = "a".repeat(MAX_UPLOAD_NAME_LEN + 1);
        assert!(ModelUpload::new("alice", name).is_err());
    }

    #[test]
    fn test_empty_owner_rejected() {
        assert!(ModelUpload::new("", "model").is_err());
    }

    #[test]
    fn test_upload_ids_unique() {
        let a = UploadId::generate();
        let b = UploadId::generate();
        assert_ne!(a, b);
    }
}
