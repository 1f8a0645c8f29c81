//! Ephemeral broadcast channel implementations

mod local;
mod redis_backed;

pub use local::LocalBroadcastChannel;
pub use redis_backed::RedisBroadcastChannel;

use confession_core::{BroadcastKind, BroadcastMessage};

/// An empty kind list subscribes to every kind
fn accepts(kinds: &[BroadcastKind], message: &BroadcastMessage) -> bool {
    kinds.is_empty() || kinds.contains(&message.event.kind())
}
