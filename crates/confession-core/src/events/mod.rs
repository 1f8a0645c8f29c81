//! Realtime events
//!
//! Two independent sources feed every viewer:
//! - [`PostChange`]: row-level INSERT/UPDATE notifications from the post store
//! - [`BroadcastMessage`]: ephemeral like/reaction counts published by viewers

mod broadcast;
mod post_change;

pub use broadcast::{BroadcastEvent, BroadcastKind, BroadcastMessage, LikePayload, ReactionPayload};
pub use post_change::{ChangeKind, PostChange};
