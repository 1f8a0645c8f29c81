//! Redis-backed broadcast channel
//!
//! `send` hands the message to a single publish task, so messages from one
//! process reach Redis in the order they were sent. Every `subscribe` opens a
//! dedicated Pub/Sub connection that lives as long as the returned subscription.

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};

use confession_common::BroadcastConfig;
use confession_core::{
    BroadcastChannel, BroadcastKind, BroadcastMessage, DomainError, RepoResult, Subscription,
};

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::{PubSubChannel, Publisher, ReceivedMessage, SubscriberBuilder};

const SOURCE: &str = "broadcast";

/// Broadcast channel over Redis Pub/Sub
pub struct RedisBroadcastChannel {
    channel: PubSubChannel,
    redis_url: String,
    buffer: usize,
    outbound: mpsc::Sender<BroadcastMessage>,
}

impl RedisBroadcastChannel {
    /// Check connectivity and start the publish task
    pub async fn connect(pool: RedisPool, topic: &str, buffer: usize) -> RedisResult<Self> {
        pool.health_check().await?;

        let channel = PubSubChannel::broadcast(topic);
        let (outbound, rx) = mpsc::channel(buffer.max(1));
        let redis_url = pool.url().to_string();
        tokio::spawn(publish_loop(Publisher::new(pool), channel.clone(), rx));

        tracing::info!(channel = %channel, "Broadcast channel connected");

        Ok(Self {
            channel,
            redis_url,
            buffer,
            outbound,
        })
    }

    pub async fn from_config(pool: RedisPool, config: &BroadcastConfig) -> RedisResult<Self> {
        Self::connect(pool, &config.topic, config.buffer).await
    }

    pub fn channel(&self) -> &PubSubChannel {
        &self.channel
    }
}

impl std::fmt::Debug for RedisBroadcastChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroadcastChannel")
            .field("channel", &self.channel)
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[async_trait]
impl BroadcastChannel for RedisBroadcastChannel {
    fn send(&self, message: BroadcastMessage) -> RepoResult<()> {
        match self.outbound.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(message)) => {
                tracing::warn!(
                    post_id = %message.event.post_id(),
                    "Broadcast queue full, dropping message"
                );
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(DomainError::ChannelClosed(SOURCE)),
        }
    }

    async fn subscribe(&self, kinds: &[BroadcastKind]) -> RepoResult<Subscription<BroadcastMessage>> {
        let raw = SubscriberBuilder::new()
            .redis_url(self.redis_url.clone())
            .buffer(self.buffer)
            .subscribe(self.channel.clone())
            .build()
            .await
            .map_err(|e| DomainError::CacheError(e.to_string()))?;

        let (tx, subscription) = Subscription::channel(self.buffer, SOURCE);
        tokio::spawn(forward_messages(raw, tx, kinds.to_vec()));

        Ok(subscription)
    }
}

async fn publish_loop(
    publisher: Publisher,
    channel: PubSubChannel,
    mut rx: mpsc::Receiver<BroadcastMessage>,
) {
    while let Some(message) = rx.recv().await {
        if let Err(e) = publisher.publish(&channel, &message).await {
            tracing::warn!(
                channel = %channel,
                post_id = %message.event.post_id(),
                error = %e,
                "Failed to publish broadcast"
            );
        }
    }
    tracing::debug!(channel = %channel, "Broadcast publisher stopped");
}

/// Decode and filter raw Pub/Sub messages. Dropping `raw` on exit releases the
/// Redis connection.
async fn forward_messages(
    mut raw: Subscription<ReceivedMessage>,
    tx: mpsc::Sender<BroadcastMessage>,
    kinds: Vec<BroadcastKind>,
) {
    loop {
        tokio::select! {
            () = tx.closed() => return,
            received = raw.recv() => {
                let Some(received) = received else {
                    return;
                };
                let message = match BroadcastMessage::from_json(&received.payload) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!(channel = %received.channel, error = %e, "Ignoring malformed broadcast");
                        continue;
                    }
                };
                if !super::accepts(&kinds, &message) {
                    continue;
                }
                if let Err(TrySendError::Closed(_)) = tx.try_send(message) {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::RedisPoolConfig;
    use confession_core::{BroadcastEvent, Emoji, PostId, ViewerId};
    use std::time::Duration;

    async fn connect_test_channel(topic: &str) -> Option<RedisBroadcastChannel> {
        let url = std::env::var("REDIS_URL").ok()?;
        let pool = RedisPool::new(RedisPoolConfig {
            url,
            max_connections: 4,
        })
        .ok()?;
        RedisBroadcastChannel::connect(pool, topic, 64).await.ok()
    }

    async fn next(sub: &mut Subscription<BroadcastMessage>) -> BroadcastMessage {
        tokio::time::timeout(Duration::from_secs(5), sub.recv())
            .await
            .expect("broadcast timed out")
            .expect("broadcast closed")
    }

    #[tokio::test]
    async fn test_redis_roundtrip_between_subscribers() {
        let topic = format!("test-{}", ViewerId::generate());
        let Some(channel) = connect_test_channel(&topic).await else {
            eprintln!("Skipping test: REDIS_URL not set or Redis unreachable");
            return;
        };

        let mut reactions = channel.subscribe(&[BroadcastKind::Reaction]).await.unwrap();
        let mut all = channel.subscribe(&[]).await.unwrap();

        let post = PostId::generate();
        let origin = ViewerId::generate();
        channel
            .send(BroadcastMessage::new(origin, BroadcastEvent::like(post, 3)))
            .unwrap();
        channel
            .send(BroadcastMessage::new(origin, BroadcastEvent::reaction(post, Emoji::Wow, 2)))
            .unwrap();

        let first = next(&mut all).await;
        assert_eq!(first.origin, origin);
        assert_eq!(first.event, BroadcastEvent::like(post, 3));
        assert_eq!(next(&mut all).await.event.kind(), BroadcastKind::Reaction);

        let reaction = next(&mut reactions).await;
        assert_eq!(reaction.event, BroadcastEvent::reaction(post, Emoji::Wow, 2));
    }
}
