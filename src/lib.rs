//! Model Hub
//!
//! A registry and serving layer for ML model bundles:
//! - multipart version uploads validated once on CPU
//! - activation, rollback and soft delete with full audit trail
//! - predictions routed through the active version
//! - live comment fan-out (in-memory or Redis pub/sub)

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::artifact::ArtifactStore;
use domain::comment::{CommentRepository, InMemoryCommentRepository};
use domain::inference::InferenceBackend;
use domain::upload::{InMemoryUploadRepository, UploadRepository};
use domain::version::{InMemoryVersionRepository, VersionRepository};
use domain::DomainError;
use infrastructure::artifact::FsArtifactStore;
use infrastructure::broadcast::BroadcasterFactory;
use infrastructure::inference::{ProcessBackend, ProcessBackendConfig};
use infrastructure::registry::{
    connect_pool, ensure_schema, PostgresCommentRepository, PostgresUploadRepository,
    PostgresVersionRepository,
};
use infrastructure::services::{
    CommentService, PredictionService, UploadService, VersionService,
};
use infrastructure::validator::SchemaValidator;

/// Wire repositories, stores and services from the configuration
pub async fn create_app_state(config: &AppConfig) -> Result<AppState, DomainError> {
    let (uploads, versions, comments): (
        Arc<dyn UploadRepository>,
        Arc<dyn VersionRepository>,
        Arc<dyn CommentRepository>,
    ) = match config.storage.backend.as_str() {
        "memory" => (
            Arc::new(InMemoryUploadRepository::new()),
            Arc::new(InMemoryVersionRepository::new()),
            Arc::new(InMemoryCommentRepository::new()),
        ),
        "postgres" => {
            let url = config.storage.database_url.as_deref().ok_or_else(|| {
                DomainError::configuration(
                    "storage.database_url is required when storage.backend is 'postgres'",
                )
            })?;
            let pool = connect_pool(url).await?;
            ensure_schema(&pool).await?;
            (
                Arc::new(PostgresUploadRepository::new(pool.clone())),
                Arc::new(PostgresVersionRepository::new(pool.clone())),
                Arc::new(PostgresCommentRepository::new(pool)),
            )
        }
        other => {
            return Err(DomainError::configuration(format!(
                "Unknown storage backend '{}'",
                other
            )))
        }
    };

    let artifacts: Arc<dyn ArtifactStore> =
        Arc::new(FsArtifactStore::new(config.artifacts.root.clone()));
    let backend: Arc<dyn InferenceBackend> = Arc::new(ProcessBackend::new(
        ProcessBackendConfig::default()
            .with_interpreter(config.inference.interpreter.clone())
            .with_timeout(Duration::from_secs(config.inference.timeout_secs)),
    ));
    let validator = Arc::new(SchemaValidator::new(artifacts.clone(), backend.clone()));
    let broadcaster = BroadcasterFactory::create(&config.broadcast).await?;

    Ok(AppState {
        upload_service: Arc::new(UploadService::new(
            uploads.clone(),
            versions.clone(),
            comments.clone(),
            artifacts.clone(),
        )),
        version_service: Arc::new(VersionService::new(
            uploads.clone(),
            versions.clone(),
            artifacts.clone(),
            validator,
        )),
        prediction_service: Arc::new(PredictionService::new(
            uploads.clone(),
            versions.clone(),
            backend,
        )),
        comment_service: Arc::new(CommentService::new(
            uploads,
            versions,
            comments,
            broadcaster,
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_app_state_with_memory_backends() {
        let config = AppConfig::default();
        assert!(create_app_state(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_postgres_backend_requires_url() {
        let mut config = AppConfig::default();
        config.storage.backend = "postgres".to_string();
        let result = create_app_state(&config).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_unknown_storage_backend_rejected() {
        let mut config = AppConfig::default();
        config.storage.backend = "floppy".to_string();
        let result = create_app_state(&config).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
