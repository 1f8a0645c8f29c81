//! A viewer's live session
//!
//! Owns the aggregation state, the liked-set and both channel subscriptions.
//! It is driven from one task: gestures and `next_update` take `&mut self`, so
//! nothing inside needs a lock. Dropping or closing the session releases both
//! subscriptions.

use std::sync::Arc;

use confession_common::{AppConfig, LikeWriteMode};
use confession_core::{
    BroadcastChannel, BroadcastEvent, BroadcastKind, BroadcastMessage, ChangeFeed, ChangeKinds, Emoji, NewPost,
    Post, PostChange, PostId, PostStore, Subscription, ViewerId,
};

use crate::error::{ClientError, ClientResult};
use crate::liked::LikedSet;
use crate::protocol::{self, LikeOutcome, LikeState, LikeTracker, PendingLike};
use crate::state::{AggregationState, Applied, Incoming};
use crate::storage::LocalStorage;

/// The collaborators a session talks to
#[derive(Clone)]
pub struct SessionPorts {
    pub store: Arc<dyn PostStore>,
    pub changes: Arc<dyn ChangeFeed>,
    pub broadcast: Arc<dyn BroadcastChannel>,
    pub storage: Arc<dyn LocalStorage>,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub like_write_mode: LikeWriteMode,
    /// Apply broadcasts this session sent itself
    pub self_delivery: bool,
    pub change_kinds: ChangeKinds,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            like_write_mode: LikeWriteMode::default(),
            self_delivery: false,
            change_kinds: ChangeKinds::ALL,
        }
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            like_write_mode: config.client.like_write_mode,
            self_delivery: config.broadcast.self_delivery,
            change_kinds: ChangeKinds::ALL,
        }
    }
}

/// A change to the displayed state, or the end of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    Applied(Applied),
    /// The named channel ended; no more events arrive from it until `resubscribe`
    Disconnected(&'static str),
}

/// Result of a like gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAttempt {
    /// Already liked or in flight; nothing was sent
    Gated,
    Confirmed(i64),
}

const BROADCAST_KINDS: [BroadcastKind; 2] = [BroadcastKind::Like, BroadcastKind::Reaction];

pub struct ViewerSession {
    viewer: ViewerId,
    ports: SessionPorts,
    options: SessionOptions,
    state: AggregationState,
    likes: LikeTracker,
    changes: Option<Subscription<PostChange>>,
    broadcasts: Option<Subscription<BroadcastMessage>>,
}

impl ViewerSession {
    /// Load the feed, then open both channels
    pub async fn start(ports: SessionPorts, options: SessionOptions) -> ClientResult<Self> {
        let viewer = ViewerId::generate();
        let liked = LikedSet::load(ports.storage.clone());

        let posts = ports.store.list_newest_first().await?;
        let mut state = AggregationState::new();
        state.load_snapshot(&posts);

        let mut session = Self {
            viewer,
            options,
            state,
            likes: LikeTracker::new(liked, options.like_write_mode),
            changes: None,
            broadcasts: None,
            ports,
        };
        session.resubscribe().await?;

        tracing::info!(viewer = %viewer, posts = posts.len(), "Viewer session started");
        Ok(session)
    }

    pub fn viewer_id(&self) -> ViewerId {
        self.viewer
    }

    pub fn state(&self) -> &AggregationState {
        &self.state
    }

    /// Posts newest first
    pub fn feed(&self) -> impl Iterator<Item = &Post> + '_ {
        self.state.feed().iter()
    }

    pub fn likes(&self, id: PostId) -> Option<i64> {
        self.state.likes(id)
    }

    pub fn reaction_count(&self, id: PostId, emoji: Emoji) -> u64 {
        self.state.reaction_count(id, emoji)
    }

    pub fn like_state(&self, id: PostId) -> LikeState {
        self.likes.state(id)
    }

    pub fn is_connected(&self) -> bool {
        self.changes.is_some() && self.broadcasts.is_some()
    }

    /// Re-open whichever channel is not live. Missed events are not replayed.
    pub async fn resubscribe(&mut self) -> ClientResult<()> {
        if self.changes.is_none() {
            let sub = self.ports.changes.subscribe(self.options.change_kinds).await?;
            self.changes = Some(sub);
        }
        if self.broadcasts.is_none() {
            let sub = self.ports.broadcast.subscribe(&BROADCAST_KINDS).await?;
            self.broadcasts = Some(sub);
        }
        Ok(())
    }

    /// Wait for the next event and apply it. `None` once both channels are gone.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            let received = {
                let changes_open = self.changes.is_some();
                let broadcasts_open = self.broadcasts.is_some();
                if !changes_open && !broadcasts_open {
                    return None;
                }

                let changes = &mut self.changes;
                let broadcasts = &mut self.broadcasts;
                tokio::select! {
                    change = recv_opt(changes), if changes_open => Received::Change(change),
                    message = recv_opt(broadcasts), if broadcasts_open => Received::Broadcast(message),
                }
            };

            match received {
                Received::Change(Some(change)) => {
                    return Some(SessionUpdate::Applied(self.state.apply(&change.into())));
                }
                Received::Broadcast(Some(message)) => {
                    if let Some(applied) = self.apply_broadcast(message) {
                        return Some(SessionUpdate::Applied(applied));
                    }
                }
                Received::Change(None) => return Some(self.disconnected_changes()),
                Received::Broadcast(None) => return Some(self.disconnected_broadcasts()),
            }
        }
    }

    /// Apply every event already queued, without waiting
    pub fn drain_pending(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();

        while let Some(change) = self.changes.as_mut().and_then(Subscription::try_recv) {
            applied.push(self.state.apply(&change.into()));
        }
        while let Some(message) = self.broadcasts.as_mut().and_then(Subscription::try_recv) {
            applied.extend(self.apply_broadcast(message));
        }

        applied
    }

    /// Validate and insert a confession; it joins the feed immediately
    pub async fn compose(&mut self, content: &str) -> ClientResult<Post> {
        let new_post = NewPost::parse(content)?;

        let post = self
            .ports
            .store
            .insert_post(&new_post.content)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to insert confession"))?;

        self.state.apply(&PostChange::insert(post.clone()).into());
        tracing::debug!(post_id = %post.id, preview = post.preview(32), "Confession posted");
        Ok(post)
    }

    /// Like a post and wait for the store write
    pub async fn like(&mut self, id: PostId) -> ClientResult<LikeAttempt> {
        let Some(pending) = self.begin_like(id)? else {
            return Ok(LikeAttempt::Gated);
        };
        let outcome = pending.commit().await;
        self.settle_like(outcome).map(LikeAttempt::Confirmed)
    }

    /// Show the tentative count and hand back the write to run
    pub fn begin_like(&mut self, id: PostId) -> ClientResult<Option<PendingLike>> {
        self.likes
            .begin(&mut self.state, self.ports.store.clone(), id)
    }

    /// Confirm or revert; a confirmed like is broadcast to other viewers
    pub fn settle_like(&mut self, outcome: LikeOutcome) -> ClientResult<i64> {
        let post_id = outcome.post_id;
        let new_count = self.likes.settle(&mut self.state, outcome)?;
        self.send(BroadcastEvent::like(post_id, new_count));
        Ok(new_count)
    }

    /// Add one reaction and broadcast the new total; returns it
    pub fn react(&mut self, id: PostId, emoji: Emoji) -> ClientResult<u64> {
        let event = protocol::react(&mut self.state, id, emoji)?;
        self.send(event);
        Ok(self.state.reaction_count(id, emoji))
    }

    /// Release both subscriptions. Further events are not delivered.
    pub fn close(&mut self) {
        let released = self.changes.is_some() || self.broadcasts.is_some();
        if let Some(mut sub) = self.changes.take() {
            sub.close();
        }
        if let Some(mut sub) = self.broadcasts.take() {
            sub.close();
        }
        if released {
            tracing::debug!(viewer = %self.viewer, "Viewer session closed");
        }
    }

    fn send(&self, event: BroadcastEvent) {
        let message = BroadcastMessage::new(self.viewer, event);
        if let Err(e) = self.ports.broadcast.send(message) {
            tracing::warn!(post_id = %event.post_id(), error = %e, "Broadcast send failed");
        }
    }

    fn apply_broadcast(&mut self, message: BroadcastMessage) -> Option<Applied> {
        if message.origin == self.viewer && !self.options.self_delivery {
            return None;
        }
        Some(self.state.apply(&Incoming::Broadcast(message.event)))
    }

    fn disconnected_changes(&mut self) -> SessionUpdate {
        let source = self.changes.take().map_or("change_feed", |s| s.source());
        tracing::warn!(viewer = %self.viewer, source, "Channel disconnected");
        SessionUpdate::Disconnected(source)
    }

    fn disconnected_broadcasts(&mut self) -> SessionUpdate {
        let source = self.broadcasts.take().map_or("broadcast", |s| s.source());
        tracing::warn!(viewer = %self.viewer, source, "Channel disconnected");
        SessionUpdate::Disconnected(source)
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSession")
            .field("viewer", &self.viewer)
            .field("posts", &self.state.feed().len())
            .field("connected", &self.is_connected())
            .finish()
    }
}

enum Received {
    Change(Option<PostChange>),
    Broadcast(Option<BroadcastMessage>),
}

async fn recv_opt<T>(sub: &mut Option<Subscription<T>>) -> Option<T> {
    match sub {
        Some(sub) => sub.recv().await,
        None => std::future::pending().await,
    }
}
