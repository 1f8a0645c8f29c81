//! Domain entities - core business objects

mod post;
mod reaction;

pub use post::{NewPost, Post, MAX_CONTENT_LENGTH};
pub use reaction::{Emoji, ReactionCount};
