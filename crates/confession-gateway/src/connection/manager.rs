//! Connection manager
//!
//! Tracks all active WebSocket connections using DashMap for thread-safe access.

use super::{Connection, ConnectionState};
use crate::protocol::GatewayMessage;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Manages all active WebSocket connections
pub struct ConnectionManager {
    /// Active connections by session ID
    connections: DashMap<String, Arc<Connection>>,
}

impl ConnectionManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Generate a new session ID
    #[must_use]
    pub fn generate_session_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Register a new connection
    pub fn add_connection(
        &self,
        session_id: String,
        sender: mpsc::Sender<GatewayMessage>,
    ) -> Arc<Connection> {
        let connection = Connection::new(session_id.clone(), sender);
        self.connections.insert(session_id.clone(), connection.clone());

        tracing::debug!(session_id = %session_id, "Connection added");

        connection
    }

    /// Remove a connection and release its subscriptions
    pub fn remove_connection(&self, session_id: &str) -> Option<Arc<Connection>> {
        let (_, connection) = self.connections.remove(session_id)?;

        connection.set_state(ConnectionState::Disconnected);
        let released = connection.release_subscriptions();

        tracing::debug!(
            session_id = %session_id,
            released = released,
            "Connection removed"
        );

        Some(connection)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of connections that have joined the feed
    pub fn joined_count(&self) -> usize {
        self.connections.iter().filter(|r| r.is_joined()).count()
    }

    /// Remove connections whose socket task has already gone away
    pub fn cleanup_closed_connections(&self) -> usize {
        let closed: Vec<String> = self
            .connections
            .iter()
            .filter(|r| r.is_closed())
            .map(|r| r.key().clone())
            .collect();

        let count = closed.len();

        for session_id in closed {
            self.remove_connection(&session_id);
        }

        if count > 0 {
            tracing::info!(count = count, "Cleaned up closed connections");
        }

        count
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .finish()
    }
}
