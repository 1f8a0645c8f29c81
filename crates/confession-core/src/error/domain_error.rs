//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::PostId;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Confession is empty")]
    EmptyContent,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Unknown reaction emoji: {0}")]
    UnknownEmoji(String),

    #[error("Malformed event payload: {0}")]
    MalformedEvent(String),

    // =========================================================================
    // Channel Errors
    // =========================================================================
    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for logs and wire responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::PostNotFound(_) => "UNKNOWN_POST",

            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::UnknownEmoji(_) => "UNKNOWN_EMOJI",
            Self::MalformedEvent(_) => "MALFORMED_EVENT",

            Self::ChannelClosed(_) => "CHANNEL_CLOSED",

            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PostNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::EmptyContent
                | Self::ContentTooLong { .. }
                | Self::UnknownEmoji(_)
                | Self::MalformedEvent(_)
        )
    }

    /// Check if the backing store or channel was unreachable
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ChannelClosed(_) | Self::DatabaseError(_) | Self::CacheError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DomainError::PostNotFound(PostId::generate());
        assert_eq!(err.code(), "UNKNOWN_POST");

        let err = DomainError::ContentTooLong { max: 500 };
        assert_eq!(err.code(), "CONTENT_TOO_LONG");
    }

    #[test]
    fn test_categories() {
        assert!(DomainError::PostNotFound(PostId::generate()).is_not_found());
        assert!(DomainError::EmptyContent.is_validation());
        assert!(!DomainError::EmptyContent.is_unavailable());
        assert!(DomainError::DatabaseError("down".to_string()).is_unavailable());
        assert!(DomainError::ChannelClosed("broadcast").is_unavailable());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::ContentTooLong { max: 500 };
        assert_eq!(err.to_string(), "Content too long: max 500 characters");

        let err = DomainError::UnknownEmoji("👽".to_string());
        assert_eq!(err.to_string(), "Unknown reaction emoji: 👽");
    }
}
