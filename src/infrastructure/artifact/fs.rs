use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::artifact::{ArtifactKind, ArtifactStore, StoredArtifacts, VersionArtifacts};
use crate::domain::upload::UploadId;
use crate::domain::version::VersionId;
use crate::domain::DomainError;

/// Filesystem-backed artifact store.
///
/// Layout: `<root>/<upload_id>/<version_id>/{model.bin,predict.py,schema.json}`.
/// References are absolute-ish paths under the root; the process backend
/// hands them straight to the interpreter.
#[derive(Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn version_dir(&self, upload_id: &UploadId, version_id: &VersionId) -> PathBuf {
        self.root.join(upload_id.as_str()).join(version_id.as_str())
    }

    async fn write_file(path: &Path, data: &[u8]) -> Result<String, DomainError> {
        tokio::fs::write(path, data)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn remove_dir(path: &Path) -> Result<(), DomainError> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(
        &self,
        upload_id: &UploadId,
        version_id: &VersionId,
        artifacts: &VersionArtifacts,
    ) -> Result<StoredArtifacts, DomainError> {
        let dir = self.version_dir(upload_id, version_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create {}: {}", dir.display(), e)))?;

        let artifact_ref =
            Self::write_file(&dir.join(ArtifactKind::Model.file_name()), &artifacts.model).await?;
        let script_ref =
            Self::write_file(&dir.join(ArtifactKind::Script.file_name()), &artifacts.script)
                .await?;
        let schema_ref = match &artifacts.schema {
            Some(schema) => {
                Some(Self::write_file(&dir.join(ArtifactKind::Schema.file_name()), schema).await?)
            }
            None => None,
        };

        Ok(StoredArtifacts {
            artifact_ref,
            script_ref,
            schema_ref,
        })
    }

    async fn read(&self, artifact_ref: &str) -> Result<Bytes, DomainError> {
        let data = tokio::fs::read(artifact_ref)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to read {}: {}", artifact_ref, e)))?;
        Ok(Bytes::from(data))
    }

    async fn delete_version(
        &self,
        upload_id: &UploadId,
        version_id: &VersionId,
    ) -> Result<(), DomainError> {
        Self::remove_dir(&self.version_dir(upload_id, version_id)).await
    }

    async fn delete_upload(&self, upload_id: &UploadId) -> Result<(), DomainError> {
        Self::remove_dir(&self.root.join(upload_id.as_str())).await
    }
}
