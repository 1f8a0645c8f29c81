//! Identifier newtypes
//!
//! Post ids are assigned by the store; viewer ids are generated per session and
//! only used to tag broadcast messages with their origin.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Error when parsing an identifier from a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("invalid identifier format")]
    InvalidFormat,
}

/// Opaque, store-assigned post identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    /// Wrap an existing UUID
    #[inline]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random id (used by in-process stores)
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    #[inline]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| IdParseError::InvalidFormat)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PostId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<PostId> for Uuid {
    fn from(id: PostId) -> Self {
        id.0
    }
}

impl std::str::FromStr for PostId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identifier of one viewing session, carried as the origin of broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerId(Uuid);

impl ViewerId {
    /// Generate a new viewer id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    #[inline]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ViewerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_id_parse() {
        let id = PostId::generate();
        let parsed: PostId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_post_id_parse_invalid() {
        assert_eq!(PostId::parse("not-a-uuid"), Err(IdParseError::InvalidFormat));
        assert_eq!(PostId::parse(""), Err(IdParseError::InvalidFormat));
    }

    #[test]
    fn test_post_id_serializes_as_string() {
        let uuid = Uuid::parse_str("6f1c8a52-3a7e-4f43-9a55-0c1c8f0e2b11").unwrap();
        let json = serde_json::to_string(&PostId::new(uuid)).unwrap();
        assert_eq!(json, "\"6f1c8a52-3a7e-4f43-9a55-0c1c8f0e2b11\"");
    }

    #[test]
    fn test_viewer_ids_are_unique() {
        assert_ne!(ViewerId::generate(), ViewerId::generate());
    }
}
