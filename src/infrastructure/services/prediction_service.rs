//! Serving predictions through the active version

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::domain::inference::InferenceBackend;
use crate::domain::upload::{UploadId, UploadRepository};
use crate::domain::version::{VersionId, VersionRepository};
use crate::domain::DomainError;

/// Result of a prediction request
#[derive(Debug, Clone)]
pub struct Prediction {
    pub output: Value,
    pub version_id: VersionId,
    pub latency_ms: u64,
}

/// Routes prediction requests to the active version of a model
#[derive(Debug)]
pub struct PredictionService {
    uploads: Arc<dyn UploadRepository>,
    versions: Arc<dyn VersionRepository>,
    backend: Arc<dyn InferenceBackend>,
}

impl PredictionService {
    pub fn new(
        uploads: Arc<dyn UploadRepository>,
        versions: Arc<dyn VersionRepository>,
        backend: Arc<dyn InferenceBackend>,
    ) -> Self {
        Self {
            uploads,
            versions,
            backend,
        }
    }

    /// Run the model on a single input object, or on each element of an
    /// input array in order. Any other JSON shape is rejected.
    pub async fn predict(
        &self,
        upload_id: &UploadId,
        input: &Value,
    ) -> Result<Prediction, DomainError> {
        self.uploads
            .get(upload_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("ModelUpload '{}' not found", upload_id)))?;

        let version = self
            .versions
            .active_for_upload(upload_id)
            .await?
            .ok_or_else(|| {
                DomainError::no_active_version(format!(
                    "Model '{}' has no active version",
                    upload_id
                ))
            })?;

        let started = Instant::now();
        let output = match input {
            Value::Object(_) => {
                self.backend
                    .run(version.artifact_ref(), version.script_ref(), input)
                    .await?
            }
            Value::Array(items) => {
                let mut outputs = Vec::with_capacity(items.len());
                for item in items {
                    let out = self
                        .backend
                        .run(version.artifact_ref(), version.script_ref(), item)
                        .await?;
                    outputs.push(out);
                }
                Value::Array(outputs)
            }
            _ => {
                return Err(DomainError::validation(
                    "Prediction input must be a JSON object or an array of objects",
                ))
            }
        };

        let latency_ms = started.elapsed().as_millis() as u64;
        debug!(upload_id = %upload_id, version_id = %version.id(), latency_ms, "Prediction served");

        Ok(Prediction {
            output,
            version_id: version.id().clone(),
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::domain::inference::mock::MockBackend;
    use crate::domain::upload::{InMemoryUploadRepository, ModelUpload};
    use crate::domain::version::{InMemoryVersionRepository, ModelVersion};

    struct Fixture {
        service: PredictionService,
        backend: Arc<MockBackend>,
        upload_id: UploadId,
        versions: Arc<InMemoryVersionRepository>,
    }

    async fn fixture(backend: MockBackend) -> Fixture {
        let uploads = Arc::new(InMemoryUploadRepository::new());
        let upload = uploads
            .create(ModelUpload::new("alice", "sentiment").unwrap())
            .await
            .unwrap();
        let versions = Arc::new(InMemoryVersionRepository::new());
        let backend = Arc::new(backend);
        Fixture {
            service: PredictionService::new(uploads, versions.clone(), backend.clone()),
            backend,
            upload_id: upload.id().clone(),
            versions,
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
    async fn test_single_prediction() {
        let fx = fixture(MockBackend::with_output(json!({"prediction": 0.9}))).await;
        let version = activate_version(&fx).await;

        let prediction = fx
            .service
            .predict(&fx.upload_id, &json!({"text": "great"}))
            .await
            .unwrap();

        assert_eq!(prediction.output, json!({"prediction": 0.9}));
        assert_eq!(&prediction.version_id, version.id());
        assert_eq!(fx.backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_runs_each_item_in_order() {
        let fx = fixture(MockBackend::with_output(json!({"prediction": 1}))).await;
        activate_version(&fx).await;

        let input = json!([{"text": "a"}, {"text": "b"}]);
        let prediction = fx.service.predict(&fx.upload_id, &input).await.unwrap();

        assert_eq!(
            prediction.output,
            json!([{"prediction": 1}, {"prediction": 1}])
        );
        let calls = fx.backend.calls();
        assert_eq!(calls[0]["text"], "a");
        assert_eq!(calls[1]["text"], "b");
    }

    #[tokio::test]
    async fn test_no_active_version() {
        let fx = fixture(MockBackend::with_output(json!({}))).await;
        let result = fx.service.predict(&fx.upload_id, &json!({})).await;
        assert!(matches!(result, Err(DomainError::NoActiveVersion { .. })));
    }

    #[tokio::test]
    async fn test_scalar_input_rejected() {
        let fx = fixture(MockBackend::with_output(json!({}))).await;
        activate_version(&fx).await;
        let result = fx.service.predict(&fx.upload_id, &json!(42)).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_unknown_model_is_not_found() {
        let fx = fixture(MockBackend::with_output(json!({}))).await;
        let result = fx.service.predict(&UploadId::generate(), &json!({})).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let fx = fixture(MockBackend::with_error(DomainError::inference("boom"))).await;
        activate_version(&fx).await;
        let result = fx.service.predict(&fx.upload_id, &json!({})).await;
        assert!(matches!(result, Err(DomainError::Inference { .. })));
    }
}
