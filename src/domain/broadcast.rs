//! Real-time comment fan-out seam
//!
//! Comments are persisted first; broadcasting is best-effort and a
//! publish failure must never fail the write. Topics are scoped per
//! upload so subscribers of one model never see another model's traffic.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::domain::comment::Comment;
use crate::domain::upload::UploadId;
use crate::domain::DomainError;

/// Pub/sub topic name. One topic per model upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    pub fn for_upload(upload_id: &UploadId) -> Self {
        Self(format!("comments:{}", upload_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events delivered to comment subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommentEvent {
    #[serde(rename = "comment.created")]
    Created { comment: Comment },
}

pub type EventStream = Pin<Box<dyn Stream<Item = CommentEvent> + Send>>;

/// Fan-out backend. Implementations exist for a single-process broadcast
/// channel and for Redis pub/sub.
#[async_trait]
pub trait CommentBroadcaster: Send + Sync + std::fmt::Debug {
    /// Deliver an event to every current subscriber of the topic.
    /// Delivery is at-most-once; subscribers that joined later miss it.
    async fn publish(&self, topic: &Topic, event: CommentEvent) -> Result<(), DomainError>;

    /// Open a live event stream for a topic
    async fn subscribe(&self, topic: &Topic) -> Result<EventStream, DomainError>;
}
