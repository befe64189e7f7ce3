//! Prediction handler

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::api::state::AppState;
use crate::api::types::{ApiError, PredictRequest, PredictResponse};
use crate::domain::upload::UploadId;

pub async fn predict(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
    Json(request): Json<PredictRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let prediction = state
        .prediction_service
        .predict(&UploadId::new(model_id), &request.input)
        .await?;
    Ok(Json(PredictResponse::from(prediction)))
}
