use thiserror::Error;

use crate::types::ChangeStatus;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid object ID: {0}")]
    InvalidObjectId(String),
    #[error("invalid change ID: {0}")]
    InvalidChangeId(String),
    #[error("invalid project name: {0:?}")]
    InvalidProjectKey(String),
    #[error("invalid branch: {0:?}")]
    InvalidBranch(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A transition requested from a status that has no such edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("draft changes cannot be abandoned")]
    DraftAbandon,
    #[error("change is {0}")]
    InvalidState(ChangeStatus),
}
