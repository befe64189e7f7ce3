//! PostgreSQL registry implementations
//!
//! IDs are stored as TEXT (uuid strings minted in the domain layer). The
//! at-most-one-active invariant is enforced twice: in the activation
//! transaction and by a partial unique index as a backstop.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

use crate::domain::comment::{Comment, CommentId, CommentRepository};
use crate::domain::upload::{ModelUpload, UploadId, UploadRepository};
use crate::domain::version::{
    ModelVersion, ValidationStatus, VersionId, VersionRepository,
};
use crate::domain::DomainError;

/// Open a connection pool against the registry database
pub async fn connect_pool(url: &str) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to connect to Postgres: {}", e)))
}

/// Create the registry tables if they do not exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DomainError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS model_uploads (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            UNIQUE (owner, name)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS model_versions (
            id TEXT PRIMARY KEY,
            upload_id TEXT NOT NULL REFERENCES model_uploads(id) ON DELETE CASCADE,
            tag TEXT NOT NULL,
            artifact_ref TEXT NOT NULL,
            script_ref TEXT NOT NULL,
            schema_ref TEXT,
            content_digest TEXT NOT NULL,
            validation_status TEXT NOT NULL,
            log TEXT,
            is_active BOOLEAN NOT NULL DEFAULT FALSE,
            is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS one_active_version_per_upload
        ON model_versions (upload_id)
        WHERE is_active AND NOT is_deleted
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS model_comments (
            id TEXT PRIMARY KEY,
            version_id TEXT NOT NULL REFERENCES model_versions(id) ON DELETE CASCADE,
            author TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create schema: {}", e)))?;
    }

    info!("Registry schema ready");
    Ok(())
}

fn row_to_upload(row: &PgRow) -> Result<ModelUpload, DomainError> {
    Ok(ModelUpload::restore(
        UploadId::new(row.try_get::<String, _>("id").map_err(db_err)?),
        row.try_get("owner").map_err(db_err)?,
        row.try_get("name").map_err(db_err)?,
        row.try_get("created_at").map_err(db_err)?,
    ))
}

fn row_to_version(row: &PgRow) -> Result<ModelVersion, DomainError> {
    let status: String = row.try_get("validation_status").map_err(db_err)?;
    Ok(ModelVersion::restore(
        VersionId::new(row.try_get::<String, _>("id").map_err(db_err)?),
        UploadId::new(row.try_get::<String, _>("upload_id").map_err(db_err)?),
        row.try_get("tag").map_err(db_err)?,
        row.try_get("artifact_ref").map_err(db_err)?,
        row.try_get("script_ref").map_err(db_err)?,
        row.try_get("schema_ref").map_err(db_err)?,
        row.try_get("content_digest").map_err(db_err)?,
        ValidationStatus::parse(&status)?,
        row.try_get("log").map_err(db_err)?,
        row.try_get("is_active").map_err(db_err)?,
        row.try_get("is_deleted").map_err(db_err)?,
        row.try_get("deleted_at").map_err(db_err)?,
        row.try_get("created_at").map_err(db_err)?,
    ))
}

fn row_to_comment(row: &PgRow) -> Result<Comment, DomainError> {
    Ok(Comment::restore(
        CommentId::new(row.try_get::<String, _>("id").map_err(db_err)?),
        VersionId::new(row.try_get::<String, _>("version_id").map_err(db_err)?),
        row.try_get("author").map_err(db_err)?,
        row.try_get("body").map_err(db_err)?,
        row.try_get("created_at").map_err(db_err)?,
    ))
}

fn db_err(e: sqlx::Error) -> DomainError {
    DomainError::storage(format!("Database error: {}", e))
}

const VERSION_COLUMNS: &str = "id, upload_id, tag, artifact_ref, script_ref, schema_ref, \
     content_digest, validation_status, log, is_active, is_deleted, deleted_at, created_at";

/// PostgreSQL implementation of UploadRepository
#[derive(Debug, Clone)]
pub struct PostgresUploadRepository {
    pool: PgPool,
}

impl PostgresUploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadRepository for PostgresUploadRepository {
    async fn get(&self, id: &UploadId) -> Result<Option<ModelUpload>, DomainError> {
        let row = sqlx::query("SELECT id, owner, name, created_at FROM model_uploads WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get upload: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_upload(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<ModelUpload>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, owner, name, created_at FROM model_uploads ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list uploads: {}", e)))?;

        rows.iter().map(row_to_upload).collect()
    }

    async fn list_for_owner(&self, owner: &str) -> Result<Vec<ModelUpload>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner, name, created_at FROM model_uploads
            WHERE owner = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list uploads: {}", e)))?;

        rows.iter().map(row_to_upload).collect()
    }

    async fn find_by_owner_and_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<ModelUpload>, DomainError> {
        let row = sqlx::query(
            "SELECT id, owner, name, created_at FROM model_uploads WHERE owner = $1 AND name = $2",
        )
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to find upload: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_upload(&row)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, upload: ModelUpload) -> Result<ModelUpload, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO model_uploads (id, owner, name, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(upload.id().as_str())
        .bind(upload.owner())
        .bind(upload.name())
        .bind(upload.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                DomainError::conflict(format!(
                    "Model '{}' already exists for owner '{}'",
                    upload.name(),
                    upload.owner()
                ))
            } else {
                DomainError::storage(format!("Failed to create upload: {}", e))
            }
        })?;

        Ok(upload)
    }

    async fn delete(&self, id: &UploadId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM model_uploads WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete upload: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of VersionRepository
#[derive(Debug, Clone)]
pub struct PostgresVersionRepository {
    pool: PgPool,
}

impl PostgresVersionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM model_versions WHERE id = $1",
            VERSION_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get version: {}", e)))?;

        match row {
            Some(row) => row_to_version(&row),
            None => Err(DomainError::not_found(format!(
                "ModelVersion '{}' not found",
                id
            ))),
        }
    }
}

#[async_trait]
impl VersionRepository for PostgresVersionRepository {
    async fn get(&self, id: &VersionId) -> Result<Option<ModelVersion>, DomainError> {
        match self.fetch(id).await {
            Ok(version) => Ok(Some(version)),
            Err(DomainError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, version: ModelVersion) -> Result<ModelVersion, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO model_versions
                (id, upload_id, tag, artifact_ref, script_ref, schema_ref,
                 content_digest, validation_status, log, is_active, is_deleted,
                 deleted_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(version.id().as_str())
        .bind(version.upload_id().as_str())
        .bind(version.tag())
        .bind(version.artifact_ref())
        .bind(version.script_ref())
        .bind(version.schema_ref())
        .bind(version.content_digest())
        .bind(version.validation_status().as_str())
        .bind(version.log())
        .bind(version.is_active())
        .bind(version.is_deleted())
        .bind(version.deleted_at())
        .bind(version.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                DomainError::conflict(format!(
                    "ModelVersion with ID '{}' already exists",
                    version.id()
                ))
            } else {
                DomainError::storage(format!("Failed to create version: {}", e))
            }
        })?;

        Ok(version)
    }

    async fn record_validation(
        &self,
        id: &VersionId,
        passed: bool,
        log: &str,
    ) -> Result<ModelVersion, DomainError> {
        let status = if passed {
            ValidationStatus::Passed
        } else {
            ValidationStatus::Failed
        };

        // pending-only guard makes the outcome write-once
        let result = sqlx::query(
            r#"
            UPDATE model_versions
            SET validation_status = $2, log = $3
            WHERE id = $1 AND validation_status = 'pending'
            "#,
        )
        .bind(id.as_str())
        .bind(status.as_str())
        .bind(log)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to record validation: {}", e)))?;

        if result.rows_affected() == 0 {
            let current = self.fetch(id).await?;
            return Err(DomainError::invalid_state(format!(
                "Validation already recorded for version '{}' ({})",
                id,
                current.validation_status()
            )));
        }

        self.fetch(id).await
    }

    async fn activate(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let row = sqlx::query(
            r#"
            SELECT upload_id, validation_status, is_deleted
            FROM model_versions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to lock version: {}", e)))?;

        let row = row.ok_or_else(|| {
            DomainError::not_found(format!("ModelVersion '{}' not found", id))
        })?;
        let upload_id: String = row.try_get("upload_id").map_err(db_err)?;
        let status: String = row.try_get("validation_status").map_err(db_err)?;
        let is_deleted: bool = row.try_get("is_deleted").map_err(db_err)?;

        if is_deleted {
            return Err(DomainError::invalid_state(format!(
                "Cannot activate deleted version '{}'",
                id
            )));
        }
        if ValidationStatus::parse(&status)? != ValidationStatus::Passed {
            return Err(DomainError::invalid_state(format!(
                "Cannot activate version '{}' with status '{}'",
                id, status
            )));
        }

        sqlx::query("UPDATE model_versions SET is_active = FALSE WHERE upload_id = $1 AND id <> $2")
            .bind(&upload_id)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to deactivate siblings: {}", e)))?;

        sqlx::query("UPDATE model_versions SET is_active = TRUE WHERE id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to activate version: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit activation: {}", e)))?;

        self.fetch(id).await
    }

    async fn deactivate(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
        let result = sqlx::query(
            "UPDATE model_versions SET is_active = FALSE WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to deactivate version: {}", e)))?;

        if result.rows_affected() == 0 {
            let current = self.fetch(id).await?;
            if current.is_deleted() {
                return Err(DomainError::invalid_state(format!(
                    "Cannot deactivate deleted version '{}'",
                    id
                )));
            }
        }

        self.fetch(id).await
    }

    async fn soft_delete(&self, id: &VersionId) -> Result<ModelVersion, DomainError> {
        // deleted_at only on first transition, so repeats are no-ops
        sqlx::query(
            r#"
            UPDATE model_versions
            SET is_deleted = TRUE, is_active = FALSE, deleted_at = $2
            WHERE id = $1 AND NOT is_deleted
            "#,
        )
        .bind(id.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to delete version: {}", e)))?;

        self.fetch(id).await
    }

    async fn active_for_upload(
        &self,
        upload_id: &UploadId,
    ) -> Result<Option<ModelVersion>, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM model_versions
            WHERE upload_id = $1 AND is_active AND NOT is_deleted
              AND validation_status = 'passed'
            "#,
            VERSION_COLUMNS
        ))
        .bind(upload_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get active version: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_version(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_upload(
        &self,
        upload_id: &UploadId,
        include_deleted: bool,
    ) -> Result<Vec<ModelVersion>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM model_versions
            WHERE upload_id = $1 AND (NOT is_deleted OR $2)
            ORDER BY created_at DESC
            "#,
            VERSION_COLUMNS
        ))
        .bind(upload_id.as_str())
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list versions: {}", e)))?;

        rows.iter().map(row_to_version).collect()
    }

    async fn count_non_deleted(&self, upload_id: &UploadId) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM model_versions WHERE upload_id = $1 AND NOT is_deleted",
        )
        .bind(upload_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to count versions: {}", e)))?;

        Ok(count as usize)
    }

    async fn delete_for_upload(&self, upload_id: &UploadId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM model_versions WHERE upload_id = $1")
            .bind(upload_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete versions: {}", e)))?;

        Ok(result.rows_affected())
    }
}

/// PostgreSQL implementation of CommentRepository
#[derive(Debug, Clone)]
pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO model_comments (id, version_id, author, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(comment.id().as_str())
        .bind(comment.version_id().as_str())
        .bind(comment.author())
        .bind(comment.body())
        .bind(comment.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create comment: {}", e)))?;

        Ok(comment)
    }

    async fn list_for_versions(
        &self,
        version_ids: &[VersionId],
    ) -> Result<Vec<Comment>, DomainError> {
        if version_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = version_ids.iter().map(VersionId::as_str).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, version_id, author, body, created_at
            FROM model_comments
            WHERE version_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list comments: {}", e)))?;

        rows.iter().map(row_to_comment).collect()
    }

    async fn delete_for_versions(&self, version_ids: &[VersionId]) -> Result<u64, DomainError> {
        if version_ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<&str> = version_ids.iter().map(VersionId::as_str).collect();
        let result = sqlx::query("DELETE FROM model_comments WHERE version_id = ANY($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete comments: {}", e)))?;

        Ok(result.rows_affected())
    }
}
