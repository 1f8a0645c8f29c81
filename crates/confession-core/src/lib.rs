//! # confession-core
//!
//! Domain layer for the confession board: posts, reaction counters, change and
//! broadcast events, and the store/channel traits the realtime core consumes.
//! This crate has no dependency on a concrete database, cache, or transport.

pub mod channel;
pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use channel::{Fanout, Subscription};
pub use entities::{Emoji, NewPost, Post, ReactionCount, MAX_CONTENT_LENGTH};
pub use error::DomainError;
pub use events::{
    BroadcastEvent, BroadcastKind, BroadcastMessage, ChangeKind, LikePayload, PostChange,
    ReactionPayload,
};
pub use traits::{BroadcastChannel, ChangeFeed, PostStore, RepoResult};
pub use value_objects::{ChangeKinds, IdParseError, PostId, ViewerId};
