pub mod comment_service;
pub mod prediction_service;
pub mod upload_service;
pub mod version_service;

pub use comment_service::CommentService;
pub use prediction_service::{Prediction, PredictionService};
pub use upload_service::UploadService;
pub use version_service::VersionService;
