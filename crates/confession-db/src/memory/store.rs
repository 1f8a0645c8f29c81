//! In-memory post store
//!
//! Keeps posts in a map and publishes every insert and update to its own change
//! feed, so one value serves as both `PostStore` and `ChangeFeed`. Used by the
//! `memory` store backend and by tests, which can also make writes fail or drop
//! every change-feed subscriber.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use confession_core::channel::{Fanout, Subscription};
use confession_core::entities::Post;
use confession_core::error::DomainError;
use confession_core::events::PostChange;
use confession_core::traits::{ChangeFeed, PostStore, RepoResult};
use confession_core::value_objects::{ChangeKinds, PostId};

use crate::repositories::post_not_found;

pub struct MemoryPostStore {
    posts: RwLock<HashMap<PostId, Post>>,
    changes: Fanout<PostChange>,
    fail_writes: AtomicBool,
    like_calls: AtomicUsize,
}

impl MemoryPostStore {
    pub fn new(buffer: usize) -> Self {
        Self {
            posts: RwLock::new(HashMap::new()),
            changes: Fanout::new("change_feed", buffer),
            fail_writes: AtomicBool::new(false),
            like_calls: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent write fail with a database error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// End every change-feed subscription, as a lost connection would
    pub fn disconnect_feed(&self) {
        self.changes.disconnect_all();
    }

    /// Number of like reads/writes issued so far
    pub fn like_calls(&self) -> usize {
        self.like_calls.load(Ordering::SeqCst)
    }

    /// Current stored row, if any
    pub fn get(&self, id: PostId) -> Option<Post> {
        self.posts.read().get(&id).cloned()
    }

    pub fn change_subscribers(&self) -> usize {
        self.changes.subscriber_count()
    }

    fn check_writable(&self) -> RepoResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError(
                "write rejected by memory store".to_string(),
            ));
        }
        Ok(())
    }

    fn set_likes(&self, id: PostId, update: impl FnOnce(i64) -> i64) -> RepoResult<Post> {
        // Publish under the write lock so notifications for a row keep store order
        let mut posts = self.posts.write();
        let post = posts.get_mut(&id).ok_or_else(|| post_not_found(id))?;
        post.likes = update(post.likes);
        self.changes.publish(&PostChange::update(post.clone()));
        Ok(post.clone())
    }
}

impl Default for MemoryPostStore {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for MemoryPostStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPostStore")
            .field("posts", &self.posts.read().len())
            .field("changes", &self.changes)
            .finish()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn insert_post(&self, content: &str) -> RepoResult<Post> {
        self.check_writable()?;

        let post = Post::new(PostId::generate(), content.to_string(), Utc::now());
        {
            let mut posts = self.posts.write();
            posts.insert(post.id, post.clone());
            self.changes.publish(&PostChange::insert(post.clone()));
        }

        tracing::debug!(post_id = %post.id, "Post inserted");
        Ok(post)
    }

    async fn update_likes(&self, id: PostId, likes: i64) -> RepoResult<()> {
        self.like_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        if likes < 0 {
            return Err(DomainError::ValidationError("likes must be >= 0".to_string()));
        }
        self.set_likes(id, |_| likes).map(|_| ())
    }

    async fn increment_likes(&self, id: PostId) -> RepoResult<i64> {
        self.like_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.set_likes(id, |likes| likes + 1).map(|post| post.likes)
    }

    async fn fetch_likes(&self, id: PostId) -> RepoResult<i64> {
        self.like_calls.fetch_add(1, Ordering::SeqCst);
        self.posts
            .read()
            .get(&id)
            .map(|post| post.likes)
            .ok_or_else(|| post_not_found(id))
    }

    async fn list_newest_first(&self) -> RepoResult<Vec<Post>> {
        let mut posts: Vec<Post> = self.posts.read().values().cloned().collect();
        posts.sort_by_key(Post::feed_key);
        Ok(posts)
    }
}

#[async_trait]
impl ChangeFeed for MemoryPostStore {
    async fn subscribe(&self, kinds: ChangeKinds) -> RepoResult<Subscription<PostChange>> {
        Ok(self.changes.subscribe(move |change| kinds.accepts(change.kind)))
    }
}
