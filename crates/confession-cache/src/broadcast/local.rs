//! In-process broadcast channel

use async_trait::async_trait;

use confession_core::{
    BroadcastChannel, BroadcastKind, BroadcastMessage, Fanout, RepoResult, Subscription,
};

/// Broadcast channel shared by sessions in one process
#[derive(Debug)]
pub struct LocalBroadcastChannel {
    fanout: Fanout<BroadcastMessage>,
}

impl LocalBroadcastChannel {
    pub fn new(buffer: usize) -> Self {
        Self {
            fanout: Fanout::new("broadcast", buffer),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.fanout.subscriber_count()
    }

    /// End every subscription, as a lost connection would
    pub fn disconnect_all(&self) {
        self.fanout.disconnect_all();
    }
}

impl Default for LocalBroadcastChannel {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl BroadcastChannel for LocalBroadcastChannel {
    fn send(&self, message: BroadcastMessage) -> RepoResult<()> {
        let delivered = self.fanout.publish(&message);
        tracing::trace!(
            event_type = message.event.kind().event_type(),
            post_id = %message.event.post_id(),
            delivered,
            "Broadcast sent"
        );
        Ok(())
    }

    async fn subscribe(&self, kinds: &[BroadcastKind]) -> RepoResult<Subscription<BroadcastMessage>> {
        let kinds = kinds.to_vec();
        Ok(self.fanout.subscribe(move |message| super::accepts(&kinds, message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confession_core::{BroadcastEvent, Emoji, PostId, ViewerId};

    #[tokio::test]
    async fn test_kind_filter() {
        let channel = LocalBroadcastChannel::default();
        let mut likes = channel.subscribe(&[BroadcastKind::Like]).await.unwrap();
        let mut everything = channel.subscribe(&[]).await.unwrap();

        let post = PostId::generate();
        let origin = ViewerId::generate();
        channel
            .send(BroadcastMessage::new(origin, BroadcastEvent::reaction(post, Emoji::Fire, 1)))
            .unwrap();
        channel
            .send(BroadcastMessage::new(origin, BroadcastEvent::like(post, 4)))
            .unwrap();

        let like = likes.recv().await.unwrap();
        assert_eq!(like.event, BroadcastEvent::like(post, 4));
        assert!(likes.try_recv().is_none());

        assert_eq!(everything.recv().await.unwrap().event.kind(), BroadcastKind::Reaction);
        assert_eq!(everything.recv().await.unwrap().event.kind(), BroadcastKind::Like);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_messages() {
        let channel = LocalBroadcastChannel::default();
        channel
            .send(BroadcastMessage::new(
                ViewerId::generate(),
                BroadcastEvent::like(PostId::generate(), 1),
            ))
            .unwrap();

        let mut late = channel.subscribe(&[]).await.unwrap();
        assert!(late.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_send_without_subscribers_is_ok() {
        let channel = LocalBroadcastChannel::default();
        let message = BroadcastMessage::new(
            ViewerId::generate(),
            BroadcastEvent::like(PostId::generate(), 1),
        );
        assert!(channel.send(message).is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_all() {
        let channel = LocalBroadcastChannel::default();
        let mut sub = channel.subscribe(&[]).await.unwrap();
        assert_eq!(channel.subscriber_count(), 1);

        channel.disconnect_all();
        assert!(sub.recv().await.is_none());
        assert_eq!(channel.subscriber_count(), 0);
    }
}
