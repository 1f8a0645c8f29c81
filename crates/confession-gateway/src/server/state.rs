//! Gateway state
//!
//! Application state for the gateway server.

use crate::connection::ConnectionManager;
use confession_common::AppConfig;
use confession_core::{BroadcastChannel, ChangeFeed, PostStore};
use std::sync::Arc;
use std::time::Duration;

/// Default heartbeat interval in milliseconds
pub const HEARTBEAT_INTERVAL_MS: u64 = 45_000;

/// Timeout for no heartbeat before considering connection dead
pub const HEARTBEAT_TIMEOUT_MS: u64 = 90_000;

/// Channel buffer size for outgoing messages
pub const MESSAGE_BUFFER_SIZE: usize = 100;

/// Per-connection tunables
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub message_buffer: usize,
    /// Self-delivery for connections whose Join leaves it unset
    pub self_delivery: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(HEARTBEAT_INTERVAL_MS),
            heartbeat_timeout: Duration::from_millis(HEARTBEAT_TIMEOUT_MS),
            message_buffer: MESSAGE_BUFFER_SIZE,
            self_delivery: false,
        }
    }
}

impl From<&AppConfig> for GatewaySettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            self_delivery: config.broadcast.self_delivery,
            ..Self::default()
        }
    }
}

/// Gateway application state
///
/// Holds the store and channel ports shared by every connection.
#[derive(Clone)]
pub struct GatewayState {
    store: Arc<dyn PostStore>,
    change_feed: Arc<dyn ChangeFeed>,
    broadcast: Arc<dyn BroadcastChannel>,
    connection_manager: Arc<ConnectionManager>,
    settings: Arc<GatewaySettings>,
}

impl GatewayState {
    pub fn new(
        store: Arc<dyn PostStore>,
        change_feed: Arc<dyn ChangeFeed>,
        broadcast: Arc<dyn BroadcastChannel>,
    ) -> Self {
        Self {
            store,
            change_feed,
            broadcast,
            connection_manager: ConnectionManager::new_shared(),
            settings: Arc::new(GatewaySettings::default()),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: GatewaySettings) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    pub fn store(&self) -> &dyn PostStore {
        self.store.as_ref()
    }

    pub fn change_feed(&self) -> &dyn ChangeFeed {
        self.change_feed.as_ref()
    }

    pub fn broadcast(&self) -> &dyn BroadcastChannel {
        self.broadcast.as_ref()
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("settings", &self.settings)
            .finish()
    }
}
