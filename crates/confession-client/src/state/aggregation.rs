//! Displayed counters reconciled from every event source
//!
//! Change-feed rows and broadcast events go through one function, [`AggregationState::apply`].
//! Counts are replaced with the incoming value, never added to, so replaying an
//! event is a no-op and the last event to arrive for a post wins.

use std::collections::{BTreeMap, HashMap};

use confession_core::{
    BroadcastEvent, ChangeKind, Emoji, Post, PostChange, PostId, ReactionCount,
};

use super::Feed;

/// An event from either channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Change(PostChange),
    Broadcast(BroadcastEvent),
}

impl From<PostChange> for Incoming {
    fn from(change: PostChange) -> Self {
        Self::Change(change)
    }
}

impl From<BroadcastEvent> for Incoming {
    fn from(event: BroadcastEvent) -> Self {
        Self::Broadcast(event)
    }
}

/// What an applied event changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    PostAdded(PostId),
    LikesChanged { post_id: PostId, likes: i64 },
    ReactionChanged { post_id: PostId, emoji: Emoji, count: u64 },
}

/// Displayed counters of one post
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostCounters {
    pub likes: i64,
    pub reactions: BTreeMap<Emoji, u64>,
    /// Bumped on every write to `likes`
    pub likes_generation: u64,
}

#[derive(Debug, Default)]
pub struct AggregationState {
    feed: Feed,
    counters: HashMap<PostId, PostCounters>,
}

impl AggregationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the initial ordered read. Reactions start at zero.
    pub fn load_snapshot(&mut self, posts: &[Post]) {
        for post in posts {
            self.feed.merge(post);
            self.write_likes(post.id, post.likes);
        }
    }

    /// Reconcile one event into the state
    pub fn apply(&mut self, incoming: &Incoming) -> Applied {
        match incoming {
            Incoming::Change(change) => {
                let post = &change.record;
                let added = self.feed.merge(post);
                self.write_likes(post.id, post.likes);

                if added {
                    if change.kind == ChangeKind::Update {
                        tracing::debug!(post_id = %post.id, "Update for unseen post, added to feed");
                    }
                    Applied::PostAdded(post.id)
                } else {
                    Applied::LikesChanged {
                        post_id: post.id,
                        likes: post.likes,
                    }
                }
            }
            Incoming::Broadcast(BroadcastEvent::Like(payload)) => {
                self.write_likes(payload.post_id, payload.new_count);
                Applied::LikesChanged {
                    post_id: payload.post_id,
                    likes: payload.new_count,
                }
            }
            Incoming::Broadcast(BroadcastEvent::Reaction(payload)) => {
                let counters = self.counters_mut(payload.post_id);
                counters.reactions.insert(payload.emoji, payload.new_count);
                Applied::ReactionChanged {
                    post_id: payload.post_id,
                    emoji: payload.emoji,
                    count: payload.new_count,
                }
            }
        }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn counters(&self, id: PostId) -> Option<&PostCounters> {
        self.counters.get(&id)
    }

    /// Displayed likes of a post in the feed
    pub fn likes(&self, id: PostId) -> Option<i64> {
        if !self.feed.contains(id) {
            return None;
        }
        Some(self.counters.get(&id).map_or(0, |c| c.likes))
    }

    pub fn reaction_count(&self, id: PostId, emoji: Emoji) -> u64 {
        self.counters
            .get(&id)
            .and_then(|c| c.reactions.get(&emoji).copied())
            .unwrap_or(0)
    }

    /// Non-zero reaction counts in display order
    pub fn reactions(&self, id: PostId) -> Vec<ReactionCount> {
        Emoji::ALL
            .iter()
            .map(|&emoji| ReactionCount::new(emoji, self.reaction_count(id, emoji)))
            .filter(|r| r.count > 0)
            .collect()
    }

    /// Number of writes to a post's likes so far
    pub fn likes_generation(&self, id: PostId) -> u64 {
        self.counters.get(&id).map_or(0, |c| c.likes_generation)
    }

    /// Overwrite displayed likes, returning the new generation
    pub(crate) fn write_likes(&mut self, id: PostId, likes: i64) -> u64 {
        let counters = self.counters_mut(id);
        counters.likes = likes;
        counters.likes_generation += 1;
        counters.likes_generation
    }

    /// Add one to a displayed reaction count, returning the new count
    pub(crate) fn increment_reaction(&mut self, id: PostId, emoji: Emoji) -> u64 {
        let counters = self.counters_mut(id);
        let count = counters.reactions.entry(emoji).or_insert(0);
        *count += 1;
        *count
    }

    fn counters_mut(&mut self, id: PostId) -> &mut PostCounters {
        self.counters.entry(id).or_default()
    }
}
