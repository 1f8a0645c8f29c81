//! Row-level change notifications from PostgreSQL

mod listener;

pub use listener::{PgChangeFeed, NOTIFY_CHANNEL};
