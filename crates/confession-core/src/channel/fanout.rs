//! In-process fan-out to many subscriptions

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::Subscription;

type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct Subscriber<T> {
    filter: Filter<T>,
    tx: mpsc::Sender<T>,
}

/// Best-effort fan-out
///
/// Every subscriber has its own bounded queue. Publishing never blocks: a full
/// queue drops the item for that subscriber, a closed queue is pruned.
pub struct Fanout<T> {
    name: &'static str,
    buffer: usize,
    subscribers: Mutex<Vec<Subscriber<T>>>,
}

impl<T: Clone + Send + 'static> Fanout<T> {
    /// Create a new fan-out with a per-subscriber queue size
    pub fn new(name: &'static str, buffer: usize) -> Self {
        Self {
            name,
            buffer,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a subscriber receiving every item accepted by `filter`
    pub fn subscribe<F>(&self, filter: F) -> Subscription<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let (tx, subscription) = Subscription::channel(self.buffer, self.name);
        self.subscribers.lock().push(Subscriber {
            filter: Box::new(filter),
            tx,
        });

        tracing::trace!(channel = self.name, "Subscriber added");
        subscription
    }

    /// Deliver an item to every interested subscriber, returning how many got it
    pub fn publish(&self, item: &T) -> usize {
        let mut delivered = 0;
        let mut subscribers = self.subscribers.lock();

        subscribers.retain(|sub| {
            if !(sub.filter)(item) {
                return !sub.tx.is_closed();
            }
            match sub.tx.try_send(item.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(channel = self.name, "Subscriber queue full, dropping event");
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            }
        });

        delivered
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|sub| !sub.tx.is_closed());
        subscribers.len()
    }

    /// Drop every subscriber, as a transport loss would
    pub fn disconnect_all(&self) {
        let dropped = std::mem::take(&mut *self.subscribers.lock());
        tracing::debug!(
            channel = self.name,
            subscribers = dropped.len(),
            "All subscribers disconnected"
        );
    }
}

impl<T> std::fmt::Debug for Fanout<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fanout")
            .field("name", &self.name)
            .field("buffer", &self.buffer)
            .finish()
    }
}
