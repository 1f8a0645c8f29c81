//! Database models (SQLx `FromRow` structs)

mod post;

pub use post::PostModel;
