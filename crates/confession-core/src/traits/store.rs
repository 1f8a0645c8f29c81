//! Persistent post store

use async_trait::async_trait;

use crate::entities::Post;
use crate::error::DomainError;
use crate::value_objects::PostId;

/// Result type for store operations
pub type RepoResult<T> = Result<T, DomainError>;

/// Durable table of posts
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a new post; id and created_at are assigned by the store
    async fn insert_post(&self, content: &str) -> RepoResult<Post>;

    /// Overwrite the likes counter of a post
    async fn update_likes(&self, id: PostId, likes: i64) -> RepoResult<()>;

    /// Atomically add one like and return the new count
    async fn increment_likes(&self, id: PostId) -> RepoResult<i64>;

    /// Fresh read of the current likes counter
    async fn fetch_likes(&self, id: PostId) -> RepoResult<i64>;

    /// All posts ordered by creation time, newest first
    async fn list_newest_first(&self) -> RepoResult<Vec<Post>>;
}
