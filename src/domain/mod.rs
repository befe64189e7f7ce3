pub mod artifact;
pub mod broadcast;
pub mod comment;
pub mod error;
pub mod inference;
pub mod upload;
pub mod validator;
pub mod version;

pub use artifact::{ArtifactKind, ArtifactStore, StoredArtifacts, VersionArtifacts};
pub use broadcast::{CommentBroadcaster, CommentEvent, EventStream, Topic};
pub use comment::{Comment, CommentId, CommentRepository};
pub use error::DomainError;
pub use inference::InferenceBackend;
pub use upload::{ModelUpload, UploadId, UploadRepository};
pub use validator::{ValidationReport, Validator};
pub use version::{
    ModelVersion, ValidationStatus, VersionCounts, VersionId, VersionRepository,
};
