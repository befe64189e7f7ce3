use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::domain::broadcast::{CommentBroadcaster, CommentEvent, EventStream, Topic};
use crate::domain::DomainError;

const DEFAULT_CAPACITY: usize = 64;

/// Single-process fan-out over tokio broadcast channels, one channel per
/// topic. Channels are created on first subscribe and pruned once the last
/// subscriber is gone, so the map stays bounded by live topics.
#[derive(Debug)]
pub struct InMemoryBroadcaster {
    topics: Mutex<HashMap<String, broadcast::Sender<CommentEvent>>>,
    capacity: usize,
}

impl InMemoryBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, topic: &Topic) -> broadcast::Sender<CommentEvent> {
        self.topics
            .lock()
            .unwrap()
            .entry(topic.as_str().to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    #[cfg(test)]
    pub fn topic_count(&self) -> usize {
        self.topics.lock().unwrap().len()
    }
}

impl Default for InMemoryBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl CommentBroadcaster for InMemoryBroadcaster {
    async fn publish(&self, topic: &Topic, event: CommentEvent) -> Result<(), DomainError> {
        let mut topics = self.topics.lock().unwrap();
        // send only fails with zero subscribers, which is not an error here
        let delivered = match topics.get(topic.as_str()) {
            Some(tx) => match tx.send(event) {
                Ok(count) => count,
                Err(_) => {
                    // last subscriber detached; free the channel
                    topics.remove(topic.as_str());
                    0
                }
            },
            None => 0,
        };
        drop(topics);
        debug!(topic = %topic, subscribers = delivered, "Published comment event");
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<EventStream, DomainError> {
        let rx = self.sender(topic).subscribe();
        // lagged receivers drop missed events and continue
        let stream = BroadcastStream::new(rx).filter_map(|item| item.ok());
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comment::Comment;
    use crate::domain::upload::UploadId;
    use crate::domain::version::VersionId;

    fn event(body: &str) -> CommentEvent {
        CommentEvent::Created {
            comment: Comment::new(VersionId::generate(), "alice", body).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_all_subscribers_receive_each_event() {
        let broadcaster = InMemoryBroadcaster::default();
        let topic = Topic::for_upload(&UploadId::new("m1"));

        let mut first = broadcaster.subscribe(&topic).await.unwrap();
        let mut second = broadcaster.subscribe(&topic).await.unwrap();

        broadcaster.publish(&topic, event("hello")).await.unwrap();

        for stream in [&mut first, &mut second] {
            let CommentEvent::Created { comment } = stream.next().await.unwrap();
            assert_eq!(comment.body(), "hello");
        }
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let broadcaster = InMemoryBroadcaster::default();
        let topic_a = Topic::for_upload(&UploadId::new("a"));
        let topic_b = Topic::for_upload(&UploadId::new("b"));

        let mut sub_b = broadcaster.subscribe(&topic_b).await.unwrap();
        broadcaster.publish(&topic_a, event("for a")).await.unwrap();
        broadcaster.publish(&topic_b, event("for b")).await.unwrap();

        let CommentEvent::Created { comment } = sub_b.next().await.unwrap();
        assert_eq!(comment.body(), "for b");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let broadcaster = InMemoryBroadcaster::default();
        let topic = Topic::for_upload(&UploadId::new("quiet"));
        broadcaster.publish(&topic, event("nobody")).await.unwrap();
    }

    #[tokio::test]
    async fn test_abandoned_topic_is_pruned() {
        let broadcaster = InMemoryBroadcaster::default();
        let topic = Topic::for_upload(&UploadId::new("m1"));

        let sub = broadcaster.subscribe(&topic).await.unwrap();
        assert_eq!(broadcaster.topic_count(), 1);
        drop(sub);

        broadcaster.publish(&topic, event("gone")).await.unwrap();
        assert_eq!(broadcaster.topic_count(), 0);

        // a never-subscribed topic allocates nothing
        broadcaster.publish(&topic, event("still gone")).await.unwrap();
        assert_eq!(broadcaster.topic_count(), 0);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let broadcaster = InMemoryBroadcaster::default();
        let topic = Topic::for_upload(&UploadId::new("m1"));

        broadcaster.publish(&topic, event("before")).await.unwrap();
        let mut sub = broadcaster.subscribe(&topic).await.unwrap();
        broadcaster.publish(&topic, event("after")).await.unwrap();

        let CommentEvent::Created { comment } = sub.next().await.unwrap();
        assert_eq!(comment.body(), "after");
    }
}
