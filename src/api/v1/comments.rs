//! Comment handlers (HTTP side; live streaming is in `api::ws`)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::api::state::AppState;
use crate::api::types::{ApiError, CommentListResponse, CommentResponse, CreateCommentRequest};
use crate::domain::upload::UploadId;

pub async fn create_comment(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .comment_service
        .create(&UploadId::new(model_id), &request.author, &request.body)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(&comment))))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state
        .comment_service
        .list(&UploadId::new(model_id))
        .await?;
    Ok(Json(CommentListResponse {
        comments: comments.iter().map(CommentResponse::from).collect(),
    }))
}
