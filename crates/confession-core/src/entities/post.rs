//! Post entity - an anonymous confession with a like counter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::DomainError;
use crate::value_objects::PostId;

/// Maximum confession length in characters
pub const MAX_CONTENT_LENGTH: usize = 500;

/// `MAX_CONTENT_LENGTH` as the `u64` the validator derive expects
const MAX_CONTENT_LENGTH_U64: u64 = MAX_CONTENT_LENGTH as u64;

/// Post entity
///
/// `id`, `content` and `created_at` are assigned once by the store and never change.
/// Only `likes` is mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
}

impl Post {
    /// Create a new Post as the store would return it
    pub fn new(id: PostId, content: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            content,
            created_at,
            likes: 0,
        }
    }

    /// Ordering key for the feed: newest first, ties broken by id
    #[inline]
    pub fn feed_key(&self) -> (std::cmp::Reverse<DateTime<Utc>>, PostId) {
        (std::cmp::Reverse(self.created_at), self.id)
    }

    /// Get a truncated preview of the content (for logs)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.content[..end]
        }
    }
}

/// Composer input, validated before it reaches the store
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, max = MAX_CONTENT_LENGTH_U64, message = "Confession must be 1-500 characters"))]
    pub content: String,
}

impl NewPost {
    /// Trim and validate composer input
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let post = Self {
            content: raw.trim().to_string(),
        };

        match post.validate() {
            Ok(()) => Ok(post),
            Err(_) if post.content.is_empty() => Err(DomainError::EmptyContent),
            Err(_) => Err(DomainError::ContentTooLong {
                max: MAX_CONTENT_LENGTH,
            }),
        }
    }
}
