//! Like protocol
//!
//! Per post and viewer: `NotLiked -> Liking -> Liked`. A like is split in three
//! steps so the session keeps applying events while the write is in flight:
//!
//! 1. [`LikeTracker::begin`] shows the tentative count (`displayed + 1`) and
//!    returns a [`PendingLike`], or nothing when the gesture is gated.
//! 2. [`PendingLike::commit`] performs the store write. It owns everything it
//!    needs and borrows nothing from the session.
//! 3. [`LikeTracker::settle`] confirms or reverts.
//!
//! A confirmed like shows the store's count unless a larger count arrived while
//! the write was in flight. A revert restores the pre-click count only if no
//! other like event for the post was applied in between; otherwise the newer
//! value stays.

use std::collections::HashMap;
use std::sync::Arc;

use confession_common::LikeWriteMode;
use confession_core::{DomainError, PostId, PostStore, RepoResult};

use crate::error::{ClientError, ClientResult};
use crate::liked::LikedSet;
use crate::state::AggregationState;

/// Like state of one post for this viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    NotLiked,
    Liking,
    Liked,
}

#[derive(Debug, Clone, Copy)]
struct Tentative {
    base: i64,
    generation: u64,
}

/// A like whose store write has not run yet
#[must_use = "a pending like does nothing until committed"]
pub struct PendingLike {
    post_id: PostId,
    mode: LikeWriteMode,
    store: Arc<dyn PostStore>,
}

impl PendingLike {
    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Write the like to the store
    pub async fn commit(self) -> LikeOutcome {
        let result = match self.mode {
            LikeWriteMode::Atomic => self.store.increment_likes(self.post_id).await,
            LikeWriteMode::ReadModifyWrite => self.read_modify_write().await,
        };
        LikeOutcome {
            post_id: self.post_id,
            result,
        }
    }

    // Two concurrent likers can read the same count and both write count + 1
    async fn read_modify_write(&self) -> RepoResult<i64> {
        let current = self.store.fetch_likes(self.post_id).await?;
        let new_count = current + 1;
        self.store.update_likes(self.post_id, new_count).await?;
        Ok(new_count)
    }
}

impl std::fmt::Debug for PendingLike {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLike")
            .field("post_id", &self.post_id)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Result of a committed like: the authoritative new count or the write error
#[derive(Debug)]
pub struct LikeOutcome {
    pub post_id: PostId,
    pub result: Result<i64, DomainError>,
}

/// Liked-set gate plus the likes currently in flight
#[derive(Debug)]
pub struct LikeTracker {
    liked: LikedSet,
    in_flight: HashMap<PostId, Tentative>,
    mode: LikeWriteMode,
}

impl LikeTracker {
    pub fn new(liked: LikedSet, mode: LikeWriteMode) -> Self {
        Self {
            liked,
            in_flight: HashMap::new(),
            mode,
        }
    }

    pub fn mode(&self) -> LikeWriteMode {
        self.mode
    }

    pub fn state(&self, id: PostId) -> LikeState {
        if self.in_flight.contains_key(&id) {
            LikeState::Liking
        } else if self.liked.contains(id) {
            LikeState::Liked
        } else {
            LikeState::NotLiked
        }
    }

    pub fn liked(&self) -> &LikedSet {
        &self.liked
    }

    /// Start a like. `Ok(None)` when the post is already liked or being liked.
    pub fn begin(
        &mut self,
        state: &mut AggregationState,
        store: Arc<dyn PostStore>,
        id: PostId,
    ) -> ClientResult<Option<PendingLike>> {
        match self.state(id) {
            LikeState::Liked | LikeState::Liking => {
                tracing::debug!(post_id = %id, "Like gesture gated");
                return Ok(None);
            }
            LikeState::NotLiked => {}
        }

        let base = state.likes(id).ok_or(ClientError::UnknownPost(id))?;
        let generation = state.write_likes(id, base + 1);
        self.in_flight.insert(id, Tentative { base, generation });

        Ok(Some(PendingLike {
            post_id: id,
            mode: self.mode,
            store,
        }))
    }

    /// Confirm or revert a committed like, returning the confirmed count
    pub fn settle(
        &mut self,
        state: &mut AggregationState,
        outcome: LikeOutcome,
    ) -> ClientResult<i64> {
        let id = outcome.post_id;
        let tentative = self
            .in_flight
            .remove(&id)
            .ok_or(ClientError::NoPendingLike(id))?;
        let untouched = state.likes_generation(id) == tentative.generation;

        match outcome.result {
            Ok(new_count) => {
                if let Err(e) = self.liked.insert(id) {
                    tracing::warn!(post_id = %id, error = %e, "Failed to persist liked-set");
                }
                let newer = state.likes(id).is_some_and(|shown| shown > new_count);
                if untouched || !newer {
                    state.write_likes(id, new_count);
                }
                tracing::debug!(post_id = %id, likes = new_count, "Like confirmed");
                Ok(new_count)
            }
            Err(e) => {
                if untouched {
                    state.write_likes(id, tentative.base);
                }
                tracing::warn!(post_id = %id, error = %e, "Like write failed, reverted");
                Err(e.into())
            }
        }
    }
}
