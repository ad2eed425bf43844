//! Session store error types

use thiserror::Error;

use crate::id::SessionId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Unknown id, or the session expired
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session already has an upload: {0}")]
    AlreadyUploaded(SessionId),

    #[error("Could not allocate a free session id after {attempts} attempts")]
    AllocationExhausted { attempts: usize },

    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),
}
