//! Connection management
//!
//! Tracks WebSocket connections and the feed subscriptions each one holds.

mod connection;
mod manager;

pub use connection::{Connection, ConnectionState};
pub use manager::ConnectionManager;
