//! Request and response types for the HTTP API

pub mod error;

pub use error::{ApiError, ApiErrorDetail, ApiErrorResponse, ApiErrorType};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::comment::Comment;
use crate::domain::upload::ModelUpload;
use crate::domain::version::{ModelVersion, ValidationStatus, VersionCounts};
use crate::infrastructure::services::Prediction;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateModelRequest {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelResponse {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<VersionCounts>,
}

impl ModelResponse {
    pub fn from_upload(upload: &ModelUpload) -> Self {
        Self {
            id: upload.id().to_string(),
            owner: upload.owner().to_string(),
            name: upload.name().to_string(),
            created_at: upload.created_at(),
            versions: None,
        }
    }

    pub fn with_counts(upload: &ModelUpload, counts: VersionCounts) -> Self {
        Self {
            versions: Some(counts),
            ..Self::from_upload(upload)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelListResponse {
    pub models: Vec<ModelResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionResponse {
    pub id: String,
    pub upload_id: String,
    pub tag: String,
    pub content_digest: String,
    pub validation_status: ValidationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&ModelVersion> for VersionResponse {
    fn from(version: &ModelVersion) -> Self {
        Self {
            id: version.id().to_string(),
            upload_id: version.upload_id().to_string(),
            tag: version.tag().to_string(),
            content_digest: version.content_digest().to_string(),
            validation_status: version.validation_status(),
            log: version.log().map(str::to_string),
            is_active: version.is_active(),
            is_deleted: version.is_deleted(),
            deleted_at: version.deleted_at(),
            created_at: version.created_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionListResponse {
    pub versions: Vec<VersionResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListVersionsQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RollbackRequest {
    pub target_version_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub input: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub output: Value,
    pub version_id: String,
    pub latency_ms: u64,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            output: prediction.output,
            version_id: prediction.version_id.to_string(),
            latency_ms: prediction.latency_ms,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub version_id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Comment> for CommentResponse {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id().to_string(),
            version_id: comment.version_id().to_string(),
            author: comment.author().to_string(),
            body: comment.body().to_string(),
            created_at: comment.created_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
}
