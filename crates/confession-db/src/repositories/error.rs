//! Error handling utilities for repositories

use confession_core::error::DomainError;
use confession_core::value_objects::PostId;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_check_violation() {
            return DomainError::ValidationError(db_err.message().to_string());
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Create a "post not found" error
pub fn post_not_found(id: PostId) -> DomainError {
    DomainError::PostNotFound(id)
}
