use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid ref pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid project in grant: {0}")]
    InvalidProject(#[from] vetter_core::CoreError),
    #[error("access config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
