pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::domain::artifact::ArtifactStore;
use crate::domain::inference::InferenceBackend;
use crate::domain::validator::{ValidationReport, Validator};
use crate::domain::version::ModelVersion;
use crate::domain::DomainError;

/// Runs a version once on CPU against a schema-derived dummy input.
///
/// Never returns an error: any failure along the way (unreadable schema,
/// crashed script, bad output shape) becomes a failed report with the
/// reason in the log, which is then recorded on the version write-once.
#[derive(Debug)]
pub struct SchemaValidator {
    store: Arc<dyn ArtifactStore>,
    backend: Arc<dyn InferenceBackend>,
}

impl SchemaValidator {
    pub fn new(store: Arc<dyn ArtifactStore>, backend: Arc<dyn InferenceBackend>) -> Self {
        Self { store, backend }
    }

    async fn load_schema(&self, version: &ModelVersion) -> Result<Value, DomainError> {
        let Some(schema_ref) = version.schema_ref() else {
            // no schema uploaded: smoke-run with an empty input
            return Ok(Value::Object(Default::default()));
        };
        let raw = self.store.read(schema_ref).await?;
        serde_json::from_slice(&raw)
            .map_err(|e| DomainError::validation(format!("Schema is not valid JSON: {}", e)))
    }

    async fn try_validate(&self, version: &ModelVersion) -> Result<String, DomainError> {
        let schema = self.load_schema(version).await?;
        let (input, output_schema) = schema::dummy_input_from_schema(&schema);

        let result = self
            .backend
            .run(version.artifact_ref(), version.script_ref(), &input)
            .await?;

        let result_obj = result.as_object().ok_or_else(|| {
            DomainError::validation("Prediction script must return a JSON object")
        })?;

        if let Some(error) = result_obj.get("error") {
            let prediction = result_obj.get("prediction");
            if prediction.is_none() || prediction.is_some_and(Value::is_null) {
                return Err(DomainError::validation(format!(
                    "Prediction error: {}",
                    error
                )));
            }
        }

        if let Some(output_schema) = &output_schema {
            schema::check_output(result_obj, output_schema).map_err(DomainError::validation)?;
        }

        let input_pretty = serde_json::to_string_pretty(&input).unwrap_or_default();
        let output_pretty = serde_json::to_string_pretty(&result).unwrap_or_default();
        Ok(format!(
            "Validation successful\n\nINPUT (from schema):\n{}\n\nOUTPUT (from predict):\n{}",
            input_pretty, output_pretty
        ))
    }
}

#[async_trait]
impl Validator for SchemaValidator {
    async fn validate(&self, version: &ModelVersion) -> ValidationReport {
        match self.try_validate(version).await {
            Ok(log) => {
                info!(version_id = %version.id(), "Version passed validation");
                ValidationReport::passed(log)
            }
            Err(e) => {
                info!(version_id = %version.id(), error = %e, "Version failed validation");
                ValidationReport::failed(format!("Validation failed\n\n{}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;

    use crate::domain::artifact::VersionArtifacts;
    use crate::domain::inference::mock::MockBackend;
    use crate::domain::upload::UploadId;
    use crate::domain::version::VersionId;
    use crate::infrastructure::artifact::InMemoryArtifactStore;

    async fn stored_version(
        store: &Arc<InMemoryArtifactStore>,
        schema: Option<&str>,
    ) -> ModelVersion {
        let upload_id = UploadId::generate();
        let version_id = VersionId::generate();
        let artifacts = VersionArtifacts::new(
            Bytes::from_static(b"weights"),
            Bytes::from_static(b"def predict(i): ..."),
            schema.map(|s| Bytes::from(s.to_owned())),
        )
        .unwrap();
        let digest = artifacts.digest();
        let stored = store.put(&upload_id, &version_id, &artifacts).await.unwrap();
        ModelVersion::new(
            version_id,
            upload_id,
            "v1",
            stored.artifact_ref,
            stored.script_ref,
            stored.schema_ref,
            digest,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_pass_builds_log_with_input_and_output() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let backend = Arc::new(MockBackend::with_output(json!({"prediction": 0.9})));
        let validator = SchemaValidator::new(store.clone(), backend.clone());

        let schema = r#"{"input": {"text": "str"}, "output": {"prediction": "float"}}"#;
        let version = stored_version(&store, Some(schema)).await;
        let report = validator.validate(&version).await;

        assert!(report.passed);
        assert!(report.log.contains("INPUT (from schema):"));
        assert!(report.log.contains("OUTPUT (from predict):"));
        // dummy input built from the schema reaches the backend
        assert_eq!(backend.calls()[0]["text"], "example");
    }

    #[tokio::test]
    async fn test_non_object_result_fails() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let backend = Arc::new(MockBackend::with_output(json!([1, 2])));
        let validator = SchemaValidator::new(store.clone(), backend);

        let version = stored_version(&store, Some("{}")).await;
        let report = validator.validate(&version).await;

        assert!(!report.passed);
        assert!(report.log.contains("JSON object"));
    }

    #[tokio::test]
    async fn test_error_result_without_prediction_fails() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let backend = Arc::new(MockBackend::with_output(
            json!({"error": "boom", "prediction": null}),
        ));
        let validator = SchemaValidator::new(store.clone(), backend);

        let version = stored_version(&store, Some("{}")).await;
        let report = validator.validate(&version).await;

        assert!(!report.passed);
        assert!(report.log.contains("Prediction error"));
    }

    #[tokio::test]
    async fn test_output_type_mismatch_fails() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let backend = Arc::new(MockBackend::with_output(json!({"prediction": "high"})));
        let validator = SchemaValidator::new(store.clone(), backend);

        let schema = r#"{"input": {"text": "str"}, "output": {"prediction": "float"}}"#;
        let version = stored_version(&store, Some(schema)).await;
        let report = validator.validate(&version).await;

        assert!(!report.passed);
        assert!(report.log.contains("Wrong type"));
    }

    #[tokio::test]
    async fn test_backend_error_becomes_failed_report() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let backend = Arc::new(MockBackend::with_error(DomainError::inference(
            "script exited with status 1",
        )));
        let validator = SchemaValidator::new(store.clone(), backend);

        let version = stored_version(&store, None).await;
        let report = validator.validate(&version).await;

        assert!(!report.passed);
        assert!(report.log.contains("script exited with status 1"));
    }

    #[tokio::test]
    async fn test_invalid_schema_json_fails() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let backend = Arc::new(MockBackend::with_output(json!({"ok": true})));
        let validator = SchemaValidator::new(store.clone(), backend);

        let version = stored_version(&store, Some("{not json")).await;
        let report = validator.validate(&version).await;

        assert!(!report.passed);
        assert!(report.log.contains("not valid JSON"));
    }
}
