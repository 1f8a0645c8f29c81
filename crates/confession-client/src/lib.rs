//! # confession-client
//!
//! The viewer-side realtime core of the confession board.
//!
//! A [`ViewerSession`] loads the feed once, then keeps it current from two
//! sources: the store's change feed (new posts, like updates) and the
//! ephemeral broadcast channel (like and reaction totals). Both feed one
//! reconciliation function in [`AggregationState`], which replaces counts
//! rather than adding to them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use confession_client::{SessionOptions, SessionPorts, ViewerSession};
//!
//! let mut session = ViewerSession::start(ports, SessionOptions::default()).await?;
//! let post = session.compose("I pretend to understand jazz").await?;
//! session.like(post.id).await?;
//! session.react(post.id, Emoji::Laugh)?;
//!
//! while let Some(update) = session.next_update().await {
//!     // re-render
//! }
//! ```

pub mod error;
pub mod liked;
pub mod protocol;
pub mod session;
pub mod state;
pub mod storage;

pub use error::{ClientError, ClientResult};
pub use liked::{LikedSet, LIKED_KEY};
pub use protocol::{LikeOutcome, LikeState, LikeTracker, PendingLike};
pub use session::{LikeAttempt, SessionOptions, SessionPorts, SessionUpdate, ViewerSession};
pub use state::{AggregationState, Applied, Feed, Incoming, PostCounters};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};
