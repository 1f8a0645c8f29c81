//! Ephemeral broadcast events
//!
//! Counts are always carried in full. Receivers replace their displayed value with
//! the payload, so applying the same message twice is a no-op.

use serde::{Deserialize, Serialize};

use crate::entities::Emoji;
use crate::error::DomainError;
use crate::value_objects::{PostId, ViewerId};

/// Broadcast event name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastKind {
    Like,
    Reaction,
}

impl BroadcastKind {
    /// Get the event type name used on the gateway
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Reaction => "REACTION",
        }
    }
}

/// "Like confirmed" payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikePayload {
    pub post_id: PostId,
    pub new_count: i64,
}

/// "Reaction incremented" payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPayload {
    pub post_id: PostId,
    pub emoji: Emoji,
    pub new_count: u64,
}

/// Application-level broadcast event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastEvent {
    Like(LikePayload),
    Reaction(ReactionPayload),
}

impl BroadcastEvent {
    /// Create a like event
    pub fn like(post_id: PostId, new_count: i64) -> Self {
        Self::Like(LikePayload { post_id, new_count })
    }

    /// Create a reaction event
    pub fn reaction(post_id: PostId, emoji: Emoji, new_count: u64) -> Self {
        Self::Reaction(ReactionPayload {
            post_id,
            emoji,
            new_count,
        })
    }

    /// Get the event name
    pub fn kind(&self) -> BroadcastKind {
        match self {
            Self::Like(_) => BroadcastKind::Like,
            Self::Reaction(_) => BroadcastKind::Reaction,
        }
    }

    /// Id of the post the event refers to
    pub fn post_id(&self) -> PostId {
        match self {
            Self::Like(p) => p.post_id,
            Self::Reaction(p) => p.post_id,
        }
    }

    /// Encode the payload alone (without event name)
    pub fn payload_value(&self) -> serde_json::Value {
        match self {
            Self::Like(p) => serde_json::to_value(p).unwrap_or_default(),
            Self::Reaction(p) => serde_json::to_value(p).unwrap_or_default(),
        }
    }

    /// Decode from an event name and a payload
    pub fn from_parts(kind: BroadcastKind, payload: serde_json::Value) -> Result<Self, DomainError> {
        let malformed = |e: serde_json::Error| DomainError::MalformedEvent(e.to_string());
        match kind {
            BroadcastKind::Like => serde_json::from_value(payload).map(Self::Like).map_err(malformed),
            BroadcastKind::Reaction => serde_json::from_value(payload)
                .map(Self::Reaction)
                .map_err(malformed),
        }
    }
}

/// A broadcast event tagged with the viewer that sent it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireMessage", into = "WireMessage")]
pub struct BroadcastMessage {
    pub origin: ViewerId,
    pub event: BroadcastEvent,
}

impl BroadcastMessage {
    /// Create a new message
    pub fn new(origin: ViewerId, event: BroadcastEvent) -> Self {
        Self { origin, event }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json).map_err(|e| DomainError::MalformedEvent(e.to_string()))
    }
}

/// On-the-wire shape: `{"origin": .., "event": "like", "payload": {..}}`
#[derive(Serialize, Deserialize)]
struct WireMessage {
    origin: ViewerId,
    event: BroadcastKind,
    payload: serde_json::Value,
}

impl From<BroadcastMessage> for WireMessage {
    fn from(msg: BroadcastMessage) -> Self {
        Self {
            origin: msg.origin,
            event: msg.event.kind(),
            payload: msg.event.payload_value(),
        }
    }
}

impl TryFrom<WireMessage> for BroadcastMessage {
    type Error = DomainError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        Ok(Self {
            origin: wire.origin,
            event: BroadcastEvent::from_parts(wire.event, wire.payload)?,
        })
    }
}
