use thiserror::Error;

use crate::application::error::ApplicationError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("Storage provider error: {0}")]
    Provider(String),
}

impl From<StorageError> for ApplicationError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(_) => ApplicationError::NotFound("File not found".to_string()),
            StorageError::Io(e) => ApplicationError::StorageError(e.to_string()),
            StorageError::InvalidKey(key) => {
                ApplicationError::StorageError(format!("Invalid blob key: {}", key))
            }
            StorageError::Provider(msg) => ApplicationError::StorageError(msg),
        }
    }
}
