use std::sync::Arc;

use tracing::info;

use super::{InMemoryBroadcaster, RedisBroadcaster};
use crate::config::BroadcastConfig;
use crate::domain::broadcast::CommentBroadcaster;
use crate::domain::DomainError;

/// Creates the fan-out backend named in the configuration
pub struct BroadcasterFactory;

impl BroadcasterFactory {
    pub async fn create(
        config: &BroadcastConfig,
    ) -> Result<Arc<dyn CommentBroadcaster>, DomainError> {
        match config.backend.as_str() {
            "memory" => {
                info!("Using in-memory comment broadcaster");
                Ok(Arc::new(InMemoryBroadcaster::new(config.capacity)))
            }
            "redis" => {
                let url = config.redis_url.as_deref().ok_or_else(|| {
                    DomainError::configuration(
                        "broadcast.redis_url is required when broadcast.backend is 'redis'",
                    )
                })?;
                info!("Using Redis comment broadcaster");
                Ok(Arc::new(RedisBroadcaster::connect(url, config.capacity).await?))
            }
            other => Err(DomainError::configuration(format!(
                "Unknown broadcast backend '{}'",
                other
            ))),
        }
    }
}
