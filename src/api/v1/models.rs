//! Model registration and listing handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::types::{ApiError, CreateModelRequest, ModelListResponse, ModelResponse};
use crate::domain::upload::UploadId;

#[derive(Debug, Deserialize)]
pub struct ListModelsQuery {
    pub owner: Option<String>,
}

pub async fn create_model(
    State(state): State<AppState>,
    Json(request): Json<CreateModelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let upload = state
        .upload_service
        .create(&request.owner, &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ModelResponse::from_upload(&upload))))
}

pub async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<ListModelsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let uploads = match query.owner.as_deref() {
        Some(owner) => state.upload_service.list_for_owner(owner).await?,
        None => state.upload_service.list().await?,
    };

    let models = uploads
        .iter()
        .map(|(upload, counts)| ModelResponse::with_counts(upload, *counts))
        .collect();
    Ok(Json(ModelListResponse { models }))
}

pub async fn get_model(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let upload = state.upload_service.get(&UploadId::new(model_id)).await?;
    Ok(Json(ModelResponse::from_upload(&upload)))
}

pub async fn delete_model(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.upload_service.delete(&UploadId::new(model_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
