//! Ordered feed of posts, newest first, merged by id

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use confession_core::{Post, PostId};

type FeedKey = (Reverse<DateTime<Utc>>, PostId);

#[derive(Debug, Default)]
pub struct Feed {
    order: BTreeSet<FeedKey>,
    posts: HashMap<PostId, Post>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a post unless its id is already present. Returns whether it was new.
    ///
    /// Content and creation time never change after insert, so a repeated
    /// delivery leaves the entry untouched.
    pub fn merge(&mut self, post: &Post) -> bool {
        if self.posts.contains_key(&post.id) {
            return false;
        }
        self.order.insert(post.feed_key());
        self.posts.insert(post.id, post.clone());
        true
    }

    pub fn contains(&self, id: PostId) -> bool {
        self.posts.contains_key(&id)
    }

    pub fn get(&self, id: PostId) -> Option<&Post> {
        self.posts.get(&id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Posts newest first
    pub fn iter(&self) -> impl Iterator<Item = &Post> + '_ {
        self.order.iter().filter_map(|(_, id)| self.posts.get(id))
    }

    pub fn ids(&self) -> Vec<PostId> {
        self.order.iter().map(|(_, id)| *id).collect()
    }
}
