pub mod entity;
pub mod repository;

pub use entity::{
    validate_version_tag, ModelVersion, ValidationStatus, VersionCounts, VersionId,
    MAX_VERSION_TAG_LEN,
};
pub use repository::{in_memory::InMemoryVersionRepository, VersionRepository};
