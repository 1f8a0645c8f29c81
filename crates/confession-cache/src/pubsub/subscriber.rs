//! Redis Pub/Sub subscriber.
//!
//! Every subscription gets its own Pub/Sub connection and listener task. The
//! listener does not reconnect: when the connection drops the subscription ends
//! and the owner decides whether to subscribe again.

use crate::pubsub::PubSubChannel;
use confession_core::Subscription;
use futures_util::StreamExt;
use redis::Client;
use tokio::sync::mpsc;

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to parse message: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("No channels to subscribe to")]
    NoChannels,
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Received message from Pub/Sub
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Channel the message was received on
    pub channel: PubSubChannel,
    /// Raw payload
    pub payload: String,
}

impl ReceivedMessage {
    fn from_redis(channel_name: &str, payload: String) -> Self {
        Self {
            channel: PubSubChannel::parse(channel_name),
            payload,
        }
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Queue size between the listener and the subscription
    pub buffer: usize,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            buffer: 256,
        }
    }
}

/// Builder for a Pub/Sub subscription
pub struct SubscriberBuilder {
    config: SubscriberConfig,
    channels: Vec<PubSubChannel>,
}

impl SubscriberBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SubscriberConfig::default(),
            channels: Vec::new(),
        }
    }

    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = url.into();
        self
    }

    #[must_use]
    pub fn buffer(mut self, size: usize) -> Self {
        self.config.buffer = size;
        self
    }

    /// Add a channel subscription
    #[must_use]
    pub fn subscribe(mut self, channel: PubSubChannel) -> Self {
        self.channels.push(channel);
        self
    }

    /// Connect, subscribe and start the listener
    pub async fn build(self) -> SubscriberResult<Subscription<ReceivedMessage>> {
        if self.channels.is_empty() {
            return Err(SubscriberError::NoChannels);
        }

        let client = Client::open(self.config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;
        for channel in &self.channels {
            pubsub.subscribe(channel.name()).await?;
            tracing::debug!(channel = %channel, "Subscribed to channel");
        }

        let (tx, subscription) = Subscription::channel(self.config.buffer, "redis_pubsub");
        tokio::spawn(listener_loop(pubsub.into_on_message(), tx));

        Ok(subscription)
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward messages until the connection drops or the subscription is released
async fn listener_loop<S>(stream: S, tx: mpsc::Sender<ReceivedMessage>)
where
    S: futures_util::Stream<Item = redis::Msg>,
{
    let mut stream = std::pin::pin!(stream);
    loop {
        tokio::select! {
            () = tx.closed() => {
                tracing::debug!("Pub/Sub subscription released");
                return;
            }
            msg = stream.next() => {
                let Some(msg) = msg else {
                    tracing::warn!("Pub/Sub stream ended");
                    return;
                };

                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping non-text Pub/Sub payload");
                        continue;
                    }
                };
                let received = ReceivedMessage::from_redis(msg.get_channel_name(), payload);

                tracing::trace!(channel = %received.channel, "Received Pub/Sub message");

                if tx.try_send(received).is_err() && tx.is_closed() {
                    return;
                }
            }
        }
    }
}
