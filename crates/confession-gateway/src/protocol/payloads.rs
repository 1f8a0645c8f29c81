//! Payload definitions for the non-dispatch op codes

use confession_core::{BroadcastEvent, BroadcastKind, DomainError};
use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Default heartbeat interval (45 seconds)
    pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 45_000;

    #[must_use]
    pub fn new() -> Self {
        Self {
            heartbeat_interval: Self::DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for op 2 (Join)
///
/// An absent `self_delivery` falls back to the server default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_delivery: Option<bool>,
}

/// Payload for op 3 (Broadcast): `{"event": "like", "payload": {"postId": .., "newCount": ..}}`
///
/// The origin is assigned by the server from the sending connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastPayload {
    pub event: BroadcastKind,
    pub payload: serde_json::Value,
}

impl BroadcastPayload {
    #[must_use]
    pub fn from_event(event: &BroadcastEvent) -> Self {
        Self {
            event: event.kind(),
            payload: event.payload_value(),
        }
    }

    /// Decode into a typed event
    pub fn into_event(self) -> Result<BroadcastEvent, DomainError> {
        BroadcastEvent::from_parts(self.event, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confession_core::{Emoji, PostId};

    #[test]
    fn test_join_payload_defaults() {
        let payload: JoinPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.self_delivery, None);

        let payload: JoinPayload = serde_json::from_str(r#"{"self_delivery": true}"#).unwrap();
        assert_eq!(payload.self_delivery, Some(true));
    }

    #[test]
    fn test_broadcast_payload_decodes_reaction() {
        let post_id = PostId::generate();
        let event = BroadcastEvent::reaction(post_id, Emoji::Fire, 4);

        let json = serde_json::to_string(&BroadcastPayload::from_event(&event)).unwrap();
        let parsed: BroadcastPayload = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.into_event().unwrap(), event);
    }

    #[test]
    fn test_broadcast_payload_rejects_mismatched_body() {
        let parsed: BroadcastPayload =
            serde_json::from_str(r#"{"event": "like", "payload": {"emoji": "x"}}"#).unwrap();
        assert!(parsed.into_event().is_err());
    }
}
