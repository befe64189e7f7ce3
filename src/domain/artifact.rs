//! Artifact bundle types and the blob store seam
//!
//! A version's artifacts are the serialized model, the prediction script
//! and an optional schema. The bundle digest is the dedupe key: two
//! uploads of the same bytes under the same model are rejected.

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::domain::upload::UploadId;
use crate::domain::version::VersionId;
use crate::domain::DomainError;

/// The three kinds of files making up a version bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Script,
    Schema,
}

impl ArtifactKind {
    /// Canonical file name inside a version's storage directory
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Model => "model.bin",
            ArtifactKind::Script => "predict.py",
            ArtifactKind::Schema => "schema.json",
        }
    }
}

/// Raw artifact bytes as received from an upload request
#[derive(Debug, Clone)]
pub struct VersionArtifacts {
    pub model: Bytes,
    pub script: Bytes,
    pub schema: Option<Bytes>,
}

impl VersionArtifacts {
    pub fn new(model: Bytes, script: Bytes, schema: Option<Bytes>) -> Result<Self, DomainError> {
        if model.is_empty() {
            return Err(DomainError::validation("Model file cannot be empty"));
        }
        if script.is_empty() {
            return Err(DomainError::validation("Prediction script cannot be empty"));
        }
        Ok(Self {
            model,
            script,
            schema,
        })
    }

    /// Hex SHA-256 over the whole bundle. The schema participates when
    /// present, so adding one to identical model bytes yields a new digest.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.model);
        hasher.update(&self.script);
        if let Some(schema) = &self.schema {
            hasher.update(schema);
        }
        hex::encode(hasher.finalize())
    }
}

/// Storage references returned by the blob store after a put
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifacts {
    pub artifact_ref: String,
    pub script_ref: String,
    pub schema_ref: Option<String>,
}

/// Blob store seam. References are opaque strings the store itself can
/// later resolve; callers never interpret them.
#[async_trait]
pub trait ArtifactStore: Send + Sync + std::fmt::Debug {
    /// Persist a version's bundle and return references to each file
    async fn put(
        &self,
        upload_id: &UploadId,
        version_id: &VersionId,
        artifacts: &VersionArtifacts,
    ) -> Result<StoredArtifacts, DomainError>;

    /// Read back a previously stored file by its reference
    async fn read(&self, artifact_ref: &str) -> Result<Bytes, DomainError>;

    /// Remove every file of one version. Missing files are not an error.
    async fn delete_version(
        &self,
        upload_id: &UploadId,
        version_id: &VersionId,
    ) -> Result<(), DomainError>;

    /// Remove every file under an upload (cascade from upload deletion)
    async fn delete_upload(&self, upload_id: &UploadId) -> Result<(), DomainError>;
}
