//! Ports - the interfaces the realtime core consumes
//!
//! The domain layer defines what it needs; `confession-db` and `confession-cache`
//! provide PostgreSQL, Redis, and in-process implementations.

mod channels;
mod store;

pub use channels::{BroadcastChannel, ChangeFeed};
pub use store::{PostStore, RepoResult};
