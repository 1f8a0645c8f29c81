//! Individual WebSocket connection
//!
//! Represents a single WebSocket connection and its state.

use crate::protocol::GatewayMessage;
use confession_core::ViewerId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Connection established, waiting for Join
    Connecting,
    /// Joined; change-feed and broadcast subscriptions are open
    Joined,
    /// Connection is closed
    Disconnected,
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique session ID
    session_id: String,

    /// Origin stamped on broadcasts sent from this connection
    viewer_id: ViewerId,

    state: Mutex<ConnectionState>,

    /// Channel to send messages to the WebSocket
    sender: mpsc::Sender<GatewayMessage>,

    /// Last sequence number sent
    sequence: AtomicU64,

    /// Held across sequence assignment and send so dispatches leave in order
    dispatch_lock: tokio::sync::Mutex<()>,

    last_heartbeat: Mutex<Instant>,

    /// Whether this connection receives its own broadcasts back
    self_delivery: AtomicBool,

    /// Tasks forwarding the feed subscriptions into `sender`
    forwarders: Mutex<Vec<AbortHandle>>,
}

impl Connection {
    pub fn new(session_id: String, sender: mpsc::Sender<GatewayMessage>) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            viewer_id: ViewerId::generate(),
            state: Mutex::new(ConnectionState::Connecting),
            sender,
            sequence: AtomicU64::new(0),
            dispatch_lock: tokio::sync::Mutex::new(()),
            last_heartbeat: Mutex::new(Instant::now()),
            self_delivery: AtomicBool::new(false),
            forwarders: Mutex::new(Vec::new()),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn viewer_id(&self) -> ViewerId {
        self.viewer_id
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    pub fn is_joined(&self) -> bool {
        self.state() == ConnectionState::Joined
    }

    /// Move from `Connecting` to `Joined`; false if the connection already joined or closed
    pub fn try_join(&self, self_delivery: bool) -> bool {
        let mut state = self.state.lock();
        if *state != ConnectionState::Connecting {
            return false;
        }
        *state = ConnectionState::Joined;
        self.self_delivery.store(self_delivery, Ordering::SeqCst);
        true
    }

    pub fn self_delivery(&self) -> bool {
        self.self_delivery.load(Ordering::SeqCst)
    }

    /// Whether a broadcast from `origin` should be dispatched to this connection
    pub fn accepts_origin(&self, origin: ViewerId) -> bool {
        origin != self.viewer_id || self.self_delivery()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn record_heartbeat(&self) {
        *self.last_heartbeat.lock() = Instant::now();
    }

    pub fn time_since_heartbeat(&self) -> Duration {
        self.last_heartbeat.lock().elapsed()
    }

    /// Track a forwarding task so it is aborted on release
    pub fn attach_forwarder(&self, handle: AbortHandle) {
        self.forwarders.lock().push(handle);
    }

    pub fn forwarder_count(&self) -> usize {
        self.forwarders.lock().len()
    }

    /// Abort the forwarding tasks, dropping their subscriptions
    pub fn release_subscriptions(&self) -> usize {
        let handles: Vec<_> = self.forwarders.lock().drain(..).collect();
        for handle in &handles {
            handle.abort();
        }
        handles.len()
    }

    /// Send a message to this connection
    pub async fn send(
        &self,
        message: GatewayMessage,
    ) -> Result<(), mpsc::error::SendError<GatewayMessage>> {
        self.sender.send(message).await
    }

    /// Dispatch an event, assigning the next sequence number. Concurrent
    /// dispatches are queued in sequence order.
    pub async fn dispatch<F>(&self, build: F) -> Result<u64, mpsc::error::SendError<GatewayMessage>>
    where
        F: FnOnce(u64) -> GatewayMessage,
    {
        let _ordered = self.dispatch_lock.lock().await;
        let sequence = self.next_sequence();
        self.send(build(sequence)).await?;
        Ok(sequence)
    }

    /// Whether the outgoing channel has been dropped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.session_id)
            .field("viewer_id", &self.viewer_id)
            .field("state", &self.state())
            .field("sequence", &self.current_sequence())
            .finish()
    }
}
