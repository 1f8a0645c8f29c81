//! Handler error types

use crate::protocol::CloseCode;
use confession_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Not joined")]
    NotJoined,

    #[error("Already joined")]
    AlreadyJoined,

    /// Store or channel failure
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Convert to a close code (if applicable)
    pub fn to_close_code(&self) -> Option<CloseCode> {
        match self {
            Self::InvalidPayload(_) => Some(CloseCode::DecodeError),
            Self::NotJoined => Some(CloseCode::NotJoined),
            Self::AlreadyJoined => Some(CloseCode::AlreadyJoined),
            Self::DomainError(e) if e.is_validation() => Some(CloseCode::DecodeError),
            Self::DomainError(_) => Some(CloseCode::UnknownError),
            Self::Internal(_) => Some(CloseCode::UnknownError),
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
