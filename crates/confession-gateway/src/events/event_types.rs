//! Gateway event types
//!
//! The event names sent in the `t` field of dispatch messages.

use confession_core::{BroadcastKind, ChangeKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayEventType {
    /// Sent after a successful Join, carries the snapshot
    Ready,
    /// A post row was inserted
    PostInsert,
    /// A post row was updated
    PostUpdate,
    /// A viewer's like was confirmed
    Like,
    /// A viewer reacted to a post
    Reaction,
}

impl GatewayEventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::PostInsert => "POST_INSERT",
            Self::PostUpdate => "POST_UPDATE",
            Self::Like => "LIKE",
            Self::Reaction => "REACTION",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "READY" => Some(Self::Ready),
            "POST_INSERT" => Some(Self::PostInsert),
            "POST_UPDATE" => Some(Self::PostUpdate),
            "LIKE" => Some(Self::Like),
            "REACTION" => Some(Self::Reaction),
            _ => None,
        }
    }
}

impl From<ChangeKind> for GatewayEventType {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Insert => Self::PostInsert,
            ChangeKind::Update => Self::PostUpdate,
        }
    }
}

impl From<BroadcastKind> for GatewayEventType {
    fn from(kind: BroadcastKind) -> Self {
        match kind {
            BroadcastKind::Like => Self::Like,
            BroadcastKind::Reaction => Self::Reaction,
        }
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<GatewayEventType> for String {
    fn from(event: GatewayEventType) -> Self {
        event.as_str().to_string()
    }
}
