use std::sync::Arc;

use crate::infrastructure::services::{
    CommentService, PredictionService, UploadService, VersionService,
};

/// Shared application state injected into all handlers
#[derive(Clone)]
pub struct AppState {
    pub upload_service: Arc<UploadService>,
    pub version_service: Arc<VersionService>,
    pub prediction_service: Arc<PredictionService>,
    pub comment_service: Arc<CommentService>,
}
