//! Redis Pub/Sub publisher.

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;
use confession_core::BroadcastMessage;
use redis::AsyncCommands;

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish a broadcast message; returns how many Redis subscribers received it
    pub async fn publish(&self, channel: &PubSubChannel, message: &BroadcastMessage) -> RedisResult<u32> {
        let payload = message.to_json()?;
        let receivers = self.publish_raw(channel, &payload).await?;

        tracing::debug!(
            channel = %channel,
            event_type = message.event.kind().event_type(),
            post_id = %message.event.post_id(),
            receivers = receivers,
            "Published broadcast"
        );

        Ok(receivers)
    }

    /// Publish a raw message to a channel
    pub async fn publish_raw(&self, channel: &PubSubChannel, message: &str) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let receivers: u32 = conn.publish(channel.name(), message).await?;
        Ok(receivers)
    }
}
