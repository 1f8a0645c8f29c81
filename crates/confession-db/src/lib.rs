//! # confession-db
//!
//! Post storage and row-level change notifications.
//!
//! ## Overview
//!
//! - Connection pool management and migrations
//! - `PgPostStore`: the `PostStore` trait over PostgreSQL via SQLx
//! - `PgChangeFeed`: the `ChangeFeed` trait over `LISTEN/NOTIFY`
//! - `MemoryPostStore`: an in-process store that is also its own change feed
//!
//! ## Usage
//!
//! ```rust,ignore
//! use confession_db::{create_pool, run_migrations, PgChangeFeed, PgPostStore, PoolConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&PoolConfig::from_env()).await?;
//!     run_migrations(&pool).await?;
//!
//!     let store = PgPostStore::new(pool.clone());
//!     let feed = PgChangeFeed::new(pool, 256);
//!     Ok(())
//! }
//! ```

pub mod change_feed;
pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use change_feed::{PgChangeFeed, NOTIFY_CHANNEL};
pub use memory::MemoryPostStore;
pub use pool::{create_pool, create_pool_from_env, run_migrations, PgPool, PoolConfig};
pub use repositories::PgPostStore;
