use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::artifact::{ArtifactKind, ArtifactStore, StoredArtifacts, VersionArtifacts};
use crate::domain::upload::UploadId;
use crate::domain::version::VersionId;
use crate::domain::DomainError;

/// In-memory artifact store for tests. References use the same
/// `<upload>/<version>/<file>` shape as the filesystem store.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    blobs: Mutex<HashMap<String, Bytes>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(upload_id: &UploadId, version_id: &VersionId, kind: ArtifactKind) -> String {
        format!("{}/{}/{}", upload_id, version_id, kind.file_name())
    }

    #[cfg(test)]
    pub fn blob_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(
        &self,
        upload_id: &UploadId,
        version_id: &VersionId,
        artifacts: &VersionArtifacts,
    ) -> Result<StoredArtifacts, DomainError> {
        let mut blobs = self.blobs.lock().unwrap();

        let artifact_ref = Self::key(upload_id, version_id, ArtifactKind::Model);
        blobs.insert(artifact_ref.clone(), artifacts.model.clone());

        let script_ref = Self::key(upload_id, version_id, ArtifactKind::Script);
        blobs.insert(script_ref.clone(), artifacts.script.clone());

        let schema_ref = artifacts.schema.as_ref().map(|schema| {
            let key = Self::key(upload_id, version_id, ArtifactKind::Schema);
            blobs.insert(key.clone(), schema.clone());
            key
        });

        Ok(StoredArtifacts {
            artifact_ref,
            script_ref,
            schema_ref,
        })
    }

    async fn read(&self, artifact_ref: &str) -> Result<Bytes, DomainError> {
        self.blobs
            .lock()
            .unwrap()
            .get(artifact_ref)
            .cloned()
            .ok_or_else(|| DomainError::storage(format!("No blob at '{}'", artifact_ref)))
    }

    async fn delete_version(
        &self,
        upload_id: &UploadId,
        version_id: &VersionId,
    ) -> Result<(), DomainError> {
        let prefix = format!("{}/{}/", upload_id, version_id);
        self.blobs
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }

    async fn delete_upload(&self, upload_id: &UploadId) -> Result<(), DomainError> {
        let prefix = format!("{}/", upload_id);
        self.blobs
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }
}
