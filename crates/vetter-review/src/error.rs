use thiserror::Error;

use vetter_core::{ProjectKey, Transition, TransitionError};
use vetter_store::StoreError;

/// How a transport layer should classify a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    Conflict,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("{action} not permitted")]
    NotPermitted { action: Transition },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Project name \"{found}\" doesn't match \"{expected}\"")]
    ProjectMismatch {
        found: ProjectKey,
        expected: ProjectKey,
    },
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotPermitted { .. } => ErrorKind::Authorization,
            Self::Transition(_) | Self::ProjectMismatch { .. } => ErrorKind::Conflict,
            Self::NotFound(_)
            | Self::Store(StoreError::ChangeNotFound(_))
            | Self::Store(StoreError::ProjectNotFound(_)) => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}
