//! Versioned HTTP API

pub mod comments;
pub mod models;
pub mod predict;
pub mod versions;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/models",
            post(models::create_model).get(models::list_models),
        )
        .route(
            "/models/{model_id}",
            get(models::get_model).delete(models::delete_model),
        )
        .route(
            "/models/{model_id}/versions",
            post(versions::upload_version).get(versions::list_versions),
        )
        .route(
            "/models/{model_id}/versions/active",
            get(versions::active_version),
        )
        .route("/models/{model_id}/rollback", post(versions::rollback))
        .route("/models/{model_id}/predict", post(predict::predict))
        .route(
            "/models/{model_id}/comments",
            post(comments::create_comment).get(comments::list_comments),
        )
        .route(
            "/versions/{version_id}",
            get(versions::get_version).delete(versions::delete_version),
        )
        .route("/versions/{version_id}/activate", post(versions::activate))
        .route(
            "/versions/{version_id}/deactivate",
            post(versions::deactivate),
        )
}
