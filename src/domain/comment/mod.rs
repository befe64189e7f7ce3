pub mod entity;
pub mod repository;

pub use entity::{Comment, CommentId, MAX_COMMENT_BODY_LEN};
pub use repository::{in_memory::InMemoryCommentRepository, CommentRepository};
