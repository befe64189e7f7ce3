//! ModelUpload domain - logical model slots

pub mod entity;
pub mod repository;

pub use entity::{validate_upload_name, ModelUpload, UploadId, MAX_UPLOAD_NAME_LEN};
pub use repository::{in_memory::InMemoryUploadRepository, UploadRepository};
