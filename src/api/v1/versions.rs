//! Version upload and lifecycle handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, ListVersionsQuery, RollbackRequest, VersionListResponse, VersionResponse,
};
use crate::domain::artifact::VersionArtifacts;
use crate::domain::upload::UploadId;
use crate::domain::version::VersionId;

struct UploadForm {
    tag: String,
    model_file: Bytes,
    predict_file: Bytes,
    schema_file: Option<Bytes>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut tag = None;
    let mut model_file = None;
    let mut predict_file = None;
    let mut schema_file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "tag" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Unreadable 'tag' field: {}", e)))?;
                tag = Some(value);
            }
            "model_file" | "predict_file" | "schema_file" => {
                let data = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("Unreadable '{}' field: {}", name, e))
                })?;
                match name.as_str() {
                    "model_file" => model_file = Some(data),
                    "predict_file" => predict_file = Some(data),
                    _ => schema_file = Some(data),
                }
            }
            // unknown fields are ignored
            _ => {}
        }
    }

    let mut missing = Vec::new();
    if tag.is_none() {
        missing.push("tag");
    }
    if model_file.is_none() {
        missing.push("model_file");
    }
    if predict_file.is_none() {
        missing.push("predict_file");
    }
    if !missing.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Missing required field(s): {}",
            missing.join(", ")
        )));
    }

    Ok(UploadForm {
        tag: tag.unwrap_or_default(),
        model_file: model_file.unwrap_or_default(),
        predict_file: predict_file.unwrap_or_default(),
        schema_file,
    })
}

pub async fn upload_version(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_upload_form(multipart).await?;
    let bundle = VersionArtifacts::new(form.model_file, form.predict_file, form.schema_file)?;

    let version = state
        .version_service
        .create_version(&UploadId::new(model_id), &form.tag, bundle)
        .await?;
    Ok((StatusCode::CREATED, Json(VersionResponse::from(&version))))
}

pub async fn list_versions(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
    Query(query): Query<ListVersionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let versions = state
        .version_service
        .list_versions(&UploadId::new(model_id), query.include_deleted)
        .await?;
    Ok(Json(VersionListResponse {
        versions: versions.iter().map(VersionResponse::from).collect(),
    }))
}

pub async fn active_version(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let model_id = UploadId::new(model_id);
    let version = state
        .version_service
        .active_version(&model_id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("Model '{}' has no active version", model_id))
        })?;
    Ok(Json(VersionResponse::from(&version)))
}

pub async fn rollback(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
    Json(request): Json<RollbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let version = state
        .version_service
        .rollback(
            &UploadId::new(model_id),
            &VersionId::new(request.target_version_id),
        )
        .await?;
    Ok(Json(VersionResponse::from(&version)))
}

pub async fn get_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let version = state
        .version_service
        .get(&VersionId::new(version_id))
        .await?;
    Ok(Json(VersionResponse::from(&version)))
}

pub async fn activate(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let version = state
        .version_service
        .activate(&VersionId::new(version_id))
        .await?;
    Ok(Json(VersionResponse::from(&version)))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let version = state
        .version_service
        .deactivate(&VersionId::new(version_id))
        .await?;
    Ok(Json(VersionResponse::from(&version)))
}

pub async fn delete_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let version = state
        .version_service
        .soft_delete(&VersionId::new(version_id))
        .await?;
    Ok(Json(VersionResponse::from(&version)))
}
