//! Pub/Sub channel definitions.
//!
//! Defines the channel naming conventions for Redis Pub/Sub.

/// Channel prefix for broadcast topics
pub const BROADCAST_PREFIX: &str = "broadcast:";

/// Pub/Sub channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// Ephemeral broadcast topic shared by every viewer
    Broadcast(String),
    /// Custom channel name
    Custom(String),
}

impl PubSubChannel {
    #[must_use]
    pub fn broadcast(topic: impl Into<String>) -> Self {
        Self::Broadcast(topic.into())
    }

    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Broadcast(topic) => format!("{BROADCAST_PREFIX}{topic}"),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a channel name back to a `PubSubChannel`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.strip_prefix(BROADCAST_PREFIX) {
            Some(topic) if !topic.is_empty() => Self::Broadcast(topic.to_string()),
            _ => Self::Custom(name.to_string()),
        }
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
