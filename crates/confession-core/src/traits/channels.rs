//! Change-notification and broadcast channels

use async_trait::async_trait;

use crate::channel::Subscription;
use crate::events::{BroadcastKind, BroadcastMessage, PostChange};
use crate::traits::RepoResult;
use crate::value_objects::ChangeKinds;

/// Push feed of row-level changes on the post table
///
/// Delivery is at-least-once and FIFO per row. When the transport is lost the
/// subscription ends; missed events are not replayed.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Subscribe to the selected change kinds
    async fn subscribe(&self, kinds: ChangeKinds) -> RepoResult<Subscription<PostChange>>;
}

/// Best-effort, non-persistent pub/sub topic
///
/// Peers that subscribe after a `send` never see that message.
#[async_trait]
pub trait BroadcastChannel: Send + Sync {
    /// Fire-and-forget publish; only fails when the channel is gone
    fn send(&self, message: BroadcastMessage) -> RepoResult<()>;

    /// Subscribe to the given event kinds
    async fn subscribe(&self, kinds: &[BroadcastKind]) -> RepoResult<Subscription<BroadcastMessage>>;
}
