//! # confession-cache
//!
//! The ephemeral broadcast channel for like and reaction counts.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Pub/Sub**: Redis publisher and per-subscription listener
//! - **Broadcast**: `RedisBroadcastChannel` across processes, `LocalBroadcastChannel` in-process
//!
//! ## Example
//!
//! ```ignore
//! use confession_cache::{RedisBroadcastChannel, RedisPool, RedisPoolConfig};
//! use confession_core::{BroadcastChannel, BroadcastEvent, BroadcastKind, BroadcastMessage};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let channel = RedisBroadcastChannel::connect(pool, "confessions", 256).await?;
//!
//! let mut likes = channel.subscribe(&[BroadcastKind::Like]).await?;
//! channel.send(BroadcastMessage::new(viewer, BroadcastEvent::like(post_id, 3)))?;
//! ```

pub mod broadcast;
pub mod pool;
pub mod pubsub;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export pubsub types
pub use pubsub::{
    PubSubChannel, Publisher, ReceivedMessage, SubscriberBuilder, SubscriberConfig,
    SubscriberError, SubscriberResult, BROADCAST_PREFIX,
};

// Re-export broadcast channels
pub use broadcast::{LocalBroadcastChannel, RedisBroadcastChannel};
