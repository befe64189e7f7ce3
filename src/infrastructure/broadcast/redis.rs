use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::domain::broadcast::{CommentBroadcaster, CommentEvent, EventStream, Topic};
use crate::domain::DomainError;

/// Redis pub/sub fan-out, for running several API instances behind a
/// load balancer.
///
/// Publishes go straight to Redis. Subscriptions are bridged: the first
/// local subscriber of a topic spawns a forwarder task that relays Redis
/// messages into a process-local broadcast channel; later subscribers
/// attach to the same channel. When the last subscriber detaches the
/// forwarder drops its Redis subscription and removes the channel.
pub struct RedisBroadcaster {
    client: redis::Client,
    publish_conn: ConnectionManager,
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<CommentEvent>>>>,
    capacity: usize,
}

impl std::fmt::Debug for RedisBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroadcaster")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl RedisBroadcaster {
    pub async fn connect(url: &str, capacity: usize) -> Result<Self, DomainError> {
        let client = redis::Client::open(url)
            .map_err(|e| DomainError::configuration(format!("Invalid Redis URL: {}", e)))?;
        let publish_conn = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| DomainError::broadcast(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            client,
            publish_conn,
            topics: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        })
    }

    async fn local_receiver(
        &self,
        topic: &Topic,
    ) -> Result<broadcast::Receiver<CommentEvent>, DomainError> {
        // subscribe under the lock so the forwarder cannot prune the
        // channel between lookup and subscribe
        if let Some(sender) = self.topics.lock().unwrap().get(topic.as_str()) {
            return Ok(sender.subscribe());
        }

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| DomainError::broadcast(format!("Failed to open pub/sub: {}", e)))?;
        pubsub
            .subscribe(topic.as_str())
            .await
            .map_err(|e| DomainError::broadcast(format!("Failed to subscribe: {}", e)))?;

        let (tx, rx) = broadcast::channel(self.capacity);
        {
            let mut topics = self.topics.lock().unwrap();
            // another subscriber may have raced us while we connected
            if let Some(existing) = topics.get(topic.as_str()) {
                return Ok(existing.subscribe());
            }
            topics.insert(topic.as_str().to_string(), tx.clone());
        }

        let forward_tx = tx;
        let topic_name = topic.as_str().to_string();
        let topics = Arc::clone(&self.topics);
        tokio::spawn(async move {
            let mut messages = pubsub.on_message();
            while let Some(msg) = messages.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(topic = %topic_name, error = %e, "Unreadable pub/sub payload");
                        continue;
                    }
                };
                match serde_json::from_str::<CommentEvent>(&payload) {
                    Ok(event) => {
                        if forward_tx.send(event).is_err() {
                            // no local subscribers left; re-check under the
                            // lock since one may attach concurrently
                            let mut topics = topics.lock().unwrap();
                            if forward_tx.receiver_count() == 0 {
                                topics.remove(&topic_name);
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(topic = %topic_name, error = %e, "Malformed comment event");
                    }
                }
            }
            debug!(topic = %topic_name, "Pub/sub forwarder stopped");
        });

        Ok(rx)
    }
}

#[async_trait]
impl CommentBroadcaster for RedisBroadcaster {
    async fn publish(&self, topic: &Topic, event: CommentEvent) -> Result<(), DomainError> {
        let payload = serde_json::to_string(&event)
            .map_err(|e| DomainError::broadcast(format!("Failed to encode event: {}", e)))?;

        let mut conn = self.publish_conn.clone();
        let _: i64 = conn
            .publish(topic.as_str(), payload)
            .await
            .map_err(|e| DomainError::broadcast(format!("Redis publish failed: {}", e)))?;
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<EventStream, DomainError> {
        let rx = self.local_receiver(topic).await?;
        let stream = BroadcastStream::new(rx).filter_map(|item| item.ok());
        Ok(Box::pin(stream))
    }
}
