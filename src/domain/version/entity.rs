//! ModelVersion entity and lifecycle state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::upload::UploadId;
use crate::domain::DomainError;

pub const MAX_VERSION_TAG_LEN: usize = 100;

/// Identifier for a ModelVersion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
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

impl From<String> for VersionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation outcome of a version. Every version starts pending and is
/// validated exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pending,
    Passed,
    Failed,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "pending" => Ok(Self::Pending),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::storage(format!(
                "unknown validation status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a version tag
pub fn validate_version_tag(tag: &str) -> Result<(), DomainError> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("version tag must not be empty"));
    }
    if trimmed.len() > MAX_VERSION_TAG_LEN {
        return Err(DomainError::validation(format!(
            "version tag must be at most {} characters",
            MAX_VERSION_TAG_LEN
        )));
    }
    Ok(())
}

/// One immutable uploaded revision of a ModelUpload: a serialized model, an
/// inference script, an optional input schema, and a validation outcome.
///
/// Invariants enforced here and by the repositories:
/// - only a passed, non-deleted version can be active;
/// - at most one non-deleted version per upload is active;
/// - the validation log is written once and never overwritten;
/// - soft delete forces deactivation and is idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVersion {
    id: VersionId,
    upload_id: UploadId,
    tag: String,
    artifact_ref: String,
    script_ref: String,
    schema_ref: Option<String>,
    content_digest: String,
    validation_status: ValidationStatus,
    log: Option<String>,
    is_active: bool,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl ModelVersion {
    pub fn new(
        id: VersionId,
        upload_id: UploadId,
        tag: impl Into<String>,
        artifact_ref: impl Into<String>,
        script_ref: impl Into<String>,
        schema_ref: Option<String>,
        content_digest: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let tag = tag.into();
        validate_version_tag(&tag)?;
        Ok(Self {
            id,
            upload_id,
            tag: tag.trim().to_string(),
            artifact_ref: artifact_ref.into(),
            script_ref: script_ref.into(),
            schema_ref,
            content_digest: content_digest.into(),
            validation_status: ValidationStatus::Pending,
            log: None,
            is_active: false,
            is_deleted: false,
            deleted_at: None,
            created_at: Utc::now(),
        })
    }

    /// Rehydrate a version from stored fields
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: VersionId,
        upload_id: UploadId,
        tag: String,
        artifact_ref: String,
        script_ref: String,
        schema_ref: Option<String>,
        content_digest: String,
        validation_status: ValidationStatus,
        log: Option<String>,
        is_active: bool,
        is_deleted: bool,
        deleted_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            upload_id,
            tag,
            artifact_ref,
            script_ref,
            schema_ref,
            content_digest,
            validation_status,
            log,
            is_active,
            is_deleted,
            deleted_at,
            created_at,
        }
    }

    // Getters

    pub fn id(&self) -> &VersionId {
        &self.id
    }

    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn artifact_ref(&self) -> &str {
        &self.artifact_ref
    }

    pub fn script_ref(&self) -> &str {
        &self.script_ref
    }

    pub fn schema_ref(&self) -> Option<&str> {
        self.schema_ref.as_deref()
    }

    pub fn content_digest(&self) -> &str {
        &self.content_digest
    }

    pub fn validation_status(&self) -> ValidationStatus {
        self.validation_status
    }

    pub fn log(&self) -> Option<&str> {
        self.log.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// A version that passed validation and is not soft-deleted; the only
    /// kind of version that may become (or stay) active.
    pub fn is_available(&self) -> bool {
        !self.is_deleted && self.validation_status == ValidationStatus::Passed
    }

    // State transitions

    /// Record the validation outcome. Runs exactly once: calling this on a
    /// non-pending version fails and leaves the existing log untouched.
    pub fn record_validation(&mut self, passed: bool, log: impl Into<String>) -> Result<(), DomainError> {
        if self.validation_status != ValidationStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "version '{}' was already validated ({})",
                self.id, self.validation_status
            )));
        }
        self.validation_status = if passed {
            ValidationStatus::Passed
        } else {
            ValidationStatus::Failed
        };
        self.log = Some(log.into());
        Ok(())
    }

    /// Mark this version active. The repository is responsible for clearing
    /// the flag on the upload's other versions within the same atomic step.
    pub fn mark_active(&mut self) -> Result<(), DomainError> {
        if self.is_deleted {
            return Err(DomainError::invalid_state(format!(
                "cannot activate deleted version '{}'",
                self.id
            )));
        }
        if self.validation_status != ValidationStatus::Passed {
            return Err(DomainError::invalid_state(format!(
                "cannot activate version '{}' with status '{}'",
                self.id, self.validation_status
            )));
        }
        self.is_active = true;
        Ok(())
    }

    pub fn mark_inactive(&mut self) {
        self.is_active = false;
    }

    /// Soft-delete: hide from serving and listings, keep for audit.
    /// Idempotent; `deleted_at` is set on the first call only.
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        if self.is_deleted {
            return;
        }
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.is_active = false;
    }
}

/// Per-upload version counters shown on dashboards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCounts {
    pub total: usize,
    pub active: usize,
    pub available: usize,
    pub failed: usize,
    pub deleted: usize,
}

impl VersionCounts {
    pub fn from_versions(versions: &[ModelVersion]) -> Self {
        let mut counts = Self {
            total: versions.len(),
            ..Self::default()
        };
        for v in versions {
            if v.is_deleted() {
                counts.deleted += 1;
                continue;
            }
            match v.validation_status() {
                ValidationStatus::Passed => {
                    counts.available += 1;
                    if v.is_active() {
                        counts.active += 1;
                    }
                }
                ValidationStatus::Failed => counts.failed += 1,
                ValidationStatus::Pending => {}
            }
        }
        counts
    }
}
