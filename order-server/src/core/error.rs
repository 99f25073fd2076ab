//! Top-level server errors

use thiserror::Error;

use crate::utils::AppError;

/// Server startup/runtime error
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Application error: {0}")]
    App(#[from] AppError),
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
