//! `LISTEN/NOTIFY` implementation of ChangeFeed
//!
//! The `posts_notify_change` trigger publishes `{"type", "record"}` on
//! [`NOTIFY_CHANNEL`] for every insert and update. One listener connection is
//! shared by every subscription: the first `subscribe` opens it and a task fans
//! each notification out to the subscribers whose kinds accept it. When the
//! connection is lost every subscription ends, and the next `subscribe` opens a
//! fresh listener.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use sqlx::postgres::{PgListener, PgPool};
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use confession_core::channel::{Fanout, Subscription};
use confession_core::events::PostChange;
use confession_core::traits::{ChangeFeed, RepoResult};
use confession_core::value_objects::ChangeKinds;

use crate::repositories::map_db_error;

/// Notification channel written by the posts trigger
pub const NOTIFY_CHANNEL: &str = "post_changes";

const SOURCE: &str = "change_feed";

struct Shared {
    changes: Fanout<PostChange>,
    // Set while a listener task is running
    listener: Mutex<Option<AbortHandle>>,
}

/// PostgreSQL change feed
pub struct PgChangeFeed {
    pool: PgPool,
    shared: Arc<Shared>,
}

impl PgChangeFeed {
    pub fn new(pool: PgPool, buffer: usize) -> Self {
        Self {
            pool,
            shared: Arc::new(Shared {
                changes: Fanout::new(SOURCE, buffer),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.shared.changes.subscriber_count()
    }

    /// Whether the shared listener connection is currently open
    pub async fn is_listening(&self) -> bool {
        self.shared.listener.lock().await.is_some()
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn subscribe(&self, kinds: ChangeKinds) -> RepoResult<Subscription<PostChange>> {
        // Held until the subscriber is registered so a listener that is
        // shutting down cannot miss it
        let mut running = self.shared.listener.lock().await;

        if running.is_none() {
            let mut listener = PgListener::connect_with(&self.pool)
                .await
                .map_err(map_db_error)?;
            listener.listen(NOTIFY_CHANNEL).await.map_err(map_db_error)?;

            let task = tokio::spawn(forward_notifications(listener, Arc::downgrade(&self.shared)));
            *running = Some(task.abort_handle());
            tracing::info!(channel = NOTIFY_CHANNEL, "Change feed listener started");
        }

        let subscription = self
            .shared
            .changes
            .subscribe(move |change: &PostChange| kinds.accepts(change.kind));

        tracing::debug!(?kinds, "Change feed subscribed");
        Ok(subscription)
    }
}

impl Drop for PgChangeFeed {
    fn drop(&mut self) {
        if let Ok(mut running) = self.shared.listener.try_lock() {
            if let Some(handle) = running.take() {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for PgChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgChangeFeed")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Publishes parsed notifications until the connection goes away or the feed
/// is dropped; then ends every subscription.
async fn forward_notifications(mut listener: PgListener, shared: Weak<Shared>) {
    loop {
        let notification = match listener.try_recv().await {
            Ok(Some(notification)) => notification,
            Ok(None) => {
                // try_recv reports a dropped connection once instead of reconnecting
                tracing::warn!("Change feed connection lost");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Change feed listener failed");
                break;
            }
        };

        let change = match PostChange::from_json(notification.payload()) {
            Ok(change) => change,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed change notification");
                continue;
            }
        };

        let Some(shared) = shared.upgrade() else {
            return;
        };
        let delivered = shared.changes.publish(&change);
        tracing::trace!(post_id = %change.post_id(), delivered, "Change published");
    }

    if let Some(shared) = shared.upgrade() {
        let mut running = shared.listener.lock().await;
        *running = None;
        shared.changes.disconnect_all();
    }
}
