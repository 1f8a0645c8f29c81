//! Like and reaction protocols

mod like;
mod reaction;

pub use like::{LikeOutcome, LikeState, LikeTracker, PendingLike};
pub use reaction::react;
