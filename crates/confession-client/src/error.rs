//! Viewer-side errors

use confession_core::{DomainError, PostId};

use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Post is not in the feed: {0}")]
    UnknownPost(PostId),

    #[error("No like in flight for post {0}")]
    NoPendingLike(PostId),

    #[error("Local storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type ClientResult<T> = Result<T, ClientError>;
