//! Row-level change notifications for the post table

use serde::{Deserialize, Serialize};

use crate::entities::Post;
use crate::error::DomainError;
use crate::value_objects::PostId;

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
}

impl ChangeKind {
    /// Get the event type name used on the gateway
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Insert => "POST_INSERT",
            Self::Update => "POST_UPDATE",
        }
    }
}

/// A change notification carrying the full new row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub record: Post,
}

impl PostChange {
    /// Create an INSERT notification
    pub fn insert(record: Post) -> Self {
        Self {
            kind: ChangeKind::Insert,
            record,
        }
    }

    /// Create an UPDATE notification
    pub fn update(record: Post) -> Self {
        Self {
            kind: ChangeKind::Update,
            record,
        }
    }

    /// Id of the changed post
    #[inline]
    pub fn post_id(&self) -> PostId {
        self.record.id
    }

    /// Parse a notification payload as emitted by the store trigger
    pub fn from_json(payload: &str) -> Result<Self, DomainError> {
        serde_json::from_str(payload).map_err(|e| DomainError::MalformedEvent(e.to_string()))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
