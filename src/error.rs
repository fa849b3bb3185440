//! Dispatch domain errors
//!
//! Every failed operation surfaces as exactly one of these, with nothing
//! written: precondition checks run before the first write, and storage
//! errors roll the surrounding transaction back.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Empty selection, malformed input, unknown ids
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Operation not allowed from the entity's current status
    #[error("{0}")]
    InvalidState(String),

    #[error("Cannot resolve zone for order {order_id} (client -> area -> zone chain is incomplete)")]
    ZoneUnresolved { order_id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DispatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        DispatchError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        DispatchError::InvalidState(message.into())
    }

    /// Wire code carried in `ErrorResponse`
    pub const fn code(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "INVALID_REQUEST",
            DispatchError::NotFound(_) => "NOT_FOUND",
            DispatchError::InvalidState(_) => "INVALID_STATE",
            DispatchError::ZoneUnresolved { .. } => "ZONE_UNRESOLVED",
            DispatchError::Database(_) => "DATABASE_ERROR",
        }
    }
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
