//! Event payload definitions

use super::GatewayEventType;
use crate::protocol::GatewayMessage;
use confession_core::{BroadcastMessage, Post, PostChange, ViewerId};
use serde::{Deserialize, Serialize};

/// READY event payload
///
/// Sent after a successful Join. `posts` is the snapshot read before the
/// subscriptions were opened, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyEvent {
    pub session_id: String,
    /// Origin stamped on broadcasts sent from this connection
    pub viewer_id: ViewerId,
    pub self_delivery: bool,
    pub posts: Vec<Post>,
}

/// Build the dispatch for a row change; `d` is the full new row
#[must_use]
pub fn change_dispatch(change: &PostChange, sequence: u64) -> GatewayMessage {
    GatewayMessage::dispatch(
        GatewayEventType::from(change.kind),
        sequence,
        serde_json::to_value(&change.record).unwrap_or_default(),
    )
}

/// Build the dispatch for a broadcast; `d` is the event payload plus its origin
#[must_use]
pub fn broadcast_dispatch(message: &BroadcastMessage, sequence: u64) -> GatewayMessage {
    let mut data = message.event.payload_value();
    if let Some(obj) = data.as_object_mut() {
        obj.insert(
            "origin".to_string(),
            serde_json::to_value(message.origin).unwrap_or_default(),
        );
    }
    GatewayMessage::dispatch(GatewayEventType::from(message.event.kind()), sequence, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confession_core::{BroadcastEvent, PostId};

    fn post(content: &str) -> Post {
        Post::new(
            PostId::generate(),
            content.to_string(),
            "2024-05-01T12:00:00Z".parse().unwrap(),
        )
    }

    #[test]
    fn test_change_dispatch_carries_row() {
        let post = post("hello");
        let msg = change_dispatch(&PostChange::update(post.clone()), 4);

        assert_eq!(msg.t.as_deref(), Some("POST_UPDATE"));
        assert_eq!(msg.s, Some(4));

        let record: Post = serde_json::from_value(msg.d.unwrap()).unwrap();
        assert_eq!(record, post);
    }

    #[test]
    fn test_broadcast_dispatch_includes_origin() {
        let origin = ViewerId::generate();
        let post_id = PostId::generate();
        let msg = broadcast_dispatch(
            &BroadcastMessage::new(origin, BroadcastEvent::like(post_id, 5)),
            1,
        );

        assert_eq!(msg.t.as_deref(), Some("LIKE"));
        let d = msg.d.unwrap();
        assert_eq!(d["newCount"], 5);
        assert_eq!(d["postId"], post_id.to_string());
        assert_eq!(d["origin"], origin.to_string());
    }
}
