use std::path::PathBuf;
use thiserror::Error;

use vetter_core::{ChangeId, ProjectKey};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not a vetter repository: {0}")]
    NotARepository(PathBuf),
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectKey),
    #[error("project already exists: {0}")]
    ProjectExists(ProjectKey),
    #[error("change not found: {0}")]
    ChangeNotFound(ChangeId),
    #[error("change already exists: {0}")]
    ChangeExists(ChangeId),
    #[error("database error: {0}")]
    Database(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("core error: {0}")]
    Core(#[from] vetter_core::CoreError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
}

macro_rules! database_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(e: $ty) -> Self {
                    StoreError::Database(e.to_string())
                }
            }
        )*
    };
}

database_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
