//! PostgreSQL implementations of the store trait

mod error;
mod post;

pub use error::{map_db_error, post_not_found};
pub use post::PgPostStore;
